use super::{Scheduler, TaskHandle};
use crate::{error::Result, rc::MutRc, subscription::Subscription};
use futures::{
  executor::{LocalPool, LocalSpawner},
  future::abortable,
  task::LocalSpawnExt,
};
use std::{
  collections::VecDeque,
  future::Future,
  time::{Duration, Instant},
};

/// A virtual clock for deterministic tests.
///
/// Time only moves when [`advance`](FakeClock::advance) is called. Timers
/// due at the same instant run in the order they were scheduled. Futures
/// handed to [`spawn`](Scheduler::spawn) run on an internal `LocalPool` that
/// is polled whenever the clock moves.
#[derive(Clone)]
pub struct FakeClock {
  timers: MutRc<ClockState>,
  pool: MutRc<LocalPool>,
  spawner: LocalSpawner,
}

struct ClockState {
  current: Instant,
  next_id: usize,
  queue: VecDeque<TimerTask>,
}

struct TimerTask {
  at: Instant,
  id: usize,
  handle: TaskHandle,
  task: Box<dyn FnOnce()>,
}

impl FakeClock {
  pub fn new(start: Instant) -> Self {
    let pool = LocalPool::new();
    let spawner = pool.spawner();
    FakeClock {
      timers: MutRc::own(ClockState {
        current: start,
        next_id: 0,
        queue: VecDeque::new(),
      }),
      pool: MutRc::own(pool),
      spawner,
    }
  }

  /// Move the clock forward by `duration`, running every timer due up to and
  /// including the new instant.
  pub fn advance(&self, duration: Duration) {
    let to = self.now() + duration;
    self.run_until_stalled();
    while let Some(task) = self.pop_expired(to) {
      if !task.handle.is_closed() {
        task.handle.finish();
        (task.task)();
      }
      self.run_until_stalled();
    }
    self.timers.rc_deref_mut().current = to;
  }

  /// Poll spawned futures until none of them can make progress.
  pub fn run_until_stalled(&self) {
    // Already running further up the stack; that call will pick up new work.
    if let Ok(mut pool) = self.pool.try_rc_deref_mut() {
      pool.run_until_stalled();
    }
  }

  /// Number of timers still waiting to fire.
  pub fn pending_tasks(&self) -> usize { self.timers.rc_deref().queue.len() }

  fn pop_expired(&self, to: Instant) -> Option<TimerTask> {
    let mut state = self.timers.rc_deref_mut();
    if state.queue.front()?.at > to {
      return None;
    }
    let task = state.queue.pop_front()?;
    state.current = task.at;
    Some(task)
  }
}

impl Default for FakeClock {
  fn default() -> Self { FakeClock::new(Instant::now()) }
}

fn order_insert(tasks: &mut VecDeque<TimerTask>, task: TimerTask) {
  let at = task.at;
  let position = tasks.make_contiguous().partition_point(|t| t.at <= at);
  tasks.insert(position, task);
}

impl Scheduler for FakeClock {
  fn now(&self) -> Instant { self.timers.rc_deref().current }

  fn schedule(
    &self,
    task: impl FnOnce() + 'static,
    delay: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    let id = {
      let mut state = self.timers.rc_deref_mut();
      let id = state.next_id;
      state.next_id += 1;
      let at = state.current + delay;
      order_insert(
        &mut state.queue,
        TimerTask { at, id, handle: handle.clone(), task: Box::new(task) },
      );
      id
    };

    let timers = self.timers.downgrade();
    handle.on_cancel(move || {
      let Some(timers) = timers.upgrade() else { return };
      // If the queue is busy the task stays queued and is skipped once its
      // handle is seen closed.
      let removed = timers.try_rc_deref_mut().ok().and_then(|mut state| {
        let position = state.queue.iter().position(|t| t.id == id)?;
        state.queue.remove(position)
      });
      drop(removed);
    });
    handle
  }

  fn spawn(
    &self,
    future: impl Future<Output = ()> + 'static,
  ) -> Result<TaskHandle> {
    let (future, abort) = abortable(future);
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.spawner.spawn_local(async move {
      if future.await.is_ok() {
        c_handle.finish();
      }
    })?;
    handle.on_cancel(move || abort.abort());
    Ok(handle)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn fires_in_time_order() {
    let clock = FakeClock::default();
    let log = MutRc::own(vec![]);
    for (name, ms) in [("c", 30), ("a", 10), ("b", 20), ("a2", 10)] {
      let log = log.clone();
      clock.schedule(
        move || log.rc_deref_mut().push(name),
        Duration::from_millis(ms),
      );
    }
    clock.advance(Duration::from_millis(19));
    assert_eq!(*log.rc_deref(), vec!["a", "a2"]);
    clock.advance(Duration::from_millis(1));
    assert_eq!(*log.rc_deref(), vec!["a", "a2", "b"]);
    clock.advance(Duration::from_millis(100));
    assert_eq!(*log.rc_deref(), vec!["a", "a2", "b", "c"]);
  }

  #[test]
  fn now_tracks_the_running_timer() {
    let clock = FakeClock::default();
    let start = clock.now();
    let seen = Rc::new(Cell::new(None));
    let c_seen = seen.clone();
    let c_clock = clock.clone();
    clock.schedule(
      move || c_seen.set(Some(c_clock.now())),
      Duration::from_millis(5),
    );
    clock.advance(Duration::from_millis(50));
    assert_eq!(seen.get(), Some(start + Duration::from_millis(5)));
    assert_eq!(clock.now(), start + Duration::from_millis(50));
  }

  #[test]
  fn cancelled_timer_is_removed() {
    let clock = FakeClock::default();
    let hit = Rc::new(Cell::new(false));
    let c_hit = hit.clone();
    let handle =
      clock.schedule(move || c_hit.set(true), Duration::from_millis(5));
    assert_eq!(clock.pending_tasks(), 1);
    handle.unsubscribe();
    assert_eq!(clock.pending_tasks(), 0);
    clock.advance(Duration::from_millis(10));
    assert!(!hit.get());
  }

  #[test]
  fn timer_scheduled_by_timer_runs_in_same_advance() {
    let clock = FakeClock::default();
    let hit = Rc::new(Cell::new(0));
    let c_hit = hit.clone();
    let c_clock = clock.clone();
    clock.schedule(
      move || {
        let inc = move || c_hit.set(c_hit.get() + 1);
        c_clock.schedule(inc, Duration::from_millis(5));
      },
      Duration::from_millis(5),
    );
    clock.advance(Duration::from_millis(10));
    assert_eq!(hit.get(), 1);
  }

  #[test]
  fn spawned_future_runs_on_advance() {
    let clock = FakeClock::default();
    let hit = Rc::new(Cell::new(false));
    let c_hit = hit.clone();
    let handle = clock
      .spawn(async move { c_hit.set(true) })
      .expect("spawn on fake clock");
    assert!(!hit.get());
    clock.advance(Duration::ZERO);
    assert!(hit.get());
    assert!(handle.is_closed());
  }

  #[test]
  fn aborted_future_never_runs() {
    let clock = FakeClock::default();
    let hit = Rc::new(Cell::new(false));
    let c_hit = hit.clone();
    let handle = clock
      .spawn(async move { c_hit.set(true) })
      .expect("spawn on fake clock");
    handle.unsubscribe();
    clock.advance(Duration::ZERO);
    assert!(!hit.get());
  }
}
