//! Time and task execution.
//!
//! Every time-based operator (`interval`, `timer`, `debounce`) and every
//! future-driven source takes a [`Scheduler`] so the same pipeline can run on
//! a real executor or under the virtual [`FakeClock`] in tests.

use crate::{error::Result, rc::MutRc, subscription::Subscription};
use std::{
  future::Future,
  time::{Duration, Instant},
};

mod fake_clock;
pub use fake_clock::FakeClock;

#[cfg(feature = "timer")]
mod local_pool;
#[cfg(feature = "timer")]
pub use local_pool::LocalPoolScheduler;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioLocalScheduler;

/// A Scheduler orders tasks in time and runs them on the current thread.
pub trait Scheduler: Clone + 'static {
  /// The scheduler's notion of the current instant.
  fn now(&self) -> Instant;

  /// Run `task` once after `delay`.
  fn schedule(
    &self,
    task: impl FnOnce() + 'static,
    delay: Duration,
  ) -> TaskHandle;

  /// Drive `future` to completion on this scheduler.
  fn spawn(&self, future: impl Future<Output = ()> + 'static)
    -> Result<TaskHandle>;

  /// Run `task` every `period`, passing the tick index starting at 0, until
  /// it returns `false` or the returned handle is unsubscribed.
  fn schedule_repeating(
    &self,
    task: impl FnMut(usize) -> bool + 'static,
    period: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    repeat_tick(self.clone(), Box::new(task), period, 0, handle.clone());
    handle
  }
}

fn repeat_tick<SD: Scheduler>(
  scheduler: SD,
  mut task: Box<dyn FnMut(usize) -> bool>,
  period: Duration,
  seq: usize,
  handle: TaskHandle,
) {
  if handle.is_closed() {
    return;
  }
  let c_scheduler = scheduler.clone();
  let c_handle = handle.clone();
  let tick = scheduler.schedule(
    move || {
      if c_handle.is_closed() {
        return;
      }
      if task(seq) {
        repeat_tick(c_scheduler, task, period, seq + 1, c_handle);
      } else {
        c_handle.finish();
      }
    },
    period,
  );
  handle.on_cancel(move || tick.unsubscribe());
}

/// Handle to a scheduled task or spawned future.
///
/// Unsubscribing cancels the task if it has not run yet. Clones share state.
#[derive(Clone, Default)]
pub struct TaskHandle(MutRc<TaskState>);

#[derive(Default)]
struct TaskState {
  closed: bool,
  cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  /// A handle for work that already finished or never started.
  pub fn closed() -> Self {
    TaskHandle(MutRc::own(TaskState { closed: true, cancel: None }))
  }

  /// Register how to cancel the underlying work, replacing any previous
  /// hook. Runs `cancel` right away when the handle is already closed.
  pub fn on_cancel(&self, cancel: impl FnOnce() + 'static) {
    let mut state = self.0.rc_deref_mut();
    if state.closed {
      drop(state);
      cancel();
    } else {
      state.cancel = Some(Box::new(cancel));
    }
  }

  /// Mark the task as done; the cancel hook is dropped without running.
  pub fn finish(&self) {
    let hook = {
      let mut state = self.0.rc_deref_mut();
      state.closed = true;
      state.cancel.take()
    };
    drop(hook);
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    let hook = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.closed = true;
      state.cancel.take()
    };
    if let Some(cancel) = hook {
      cancel();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}
