//! Hot, multicast sources.
//!
//! A [`Subject`] is both an [`Observer`] (push values into it) and an
//! [`Observable`] (subscribe to what is pushed). Observers registered on the
//! subject receive every value in registration order.

use crate::{
  observable::Observable,
  observer::{BoxObserver, Notification, Observer},
  rc::{MutRc, WeakRc},
};
use std::collections::VecDeque;

mod subscribers;
pub use subscribers::SubjectSubscription;
use subscribers::Subscribers;

pub struct Subject<Item, Err>(MutRc<SubjectState<Item, Err>>);

struct SubjectState<Item, Err> {
  subscribers: Subscribers<Item, Err>,
  emitting: bool,
  pending: VecDeque<Notification<Item, Err>>,
  stopped: Option<Terminal<Err>>,
}

#[derive(Clone)]
enum Terminal<Err> {
  Error(Err),
  Complete,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject(MutRc::own(SubjectState {
      subscribers: Subscribers::default(),
      emitting: false,
      pending: VecDeque::new(),
      stopped: None,
    }))
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently registered.
  pub fn subscriber_count(&self) -> usize {
    self.0.rc_deref().subscribers.live_count()
  }

  /// `true` once `error` or `complete` was called.
  pub fn is_stopped(&self) -> bool { self.0.rc_deref().stopped.is_some() }

  fn downgrade(&self) -> WeakRc<SubjectState<Item, Err>> { self.0.downgrade() }
}

impl<Item: Clone, Err: Clone> Subject<Item, Err> {
  fn emit(&self, notification: Notification<Item, Err>) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.stopped.is_some() {
        tracing::trace!("subject already stopped, notification dropped");
        return;
      }
      match &notification {
        Notification::Error(err) => {
          state.stopped = Some(Terminal::Error(err.clone()))
        }
        Notification::Complete => state.stopped = Some(Terminal::Complete),
        Notification::Next(_) => {}
      }
      if state.emitting {
        tracing::debug!("re-entrant subject push queued");
        state.pending.push_back(notification);
        return;
      }
      state.emitting = true;
    }

    let mut current = Some(notification);
    while let Some(notification) = current {
      self.deliver(notification);
      let mut state = self.0.rc_deref_mut();
      current = state.pending.pop_front();
      if current.is_none() {
        state.emitting = false;
      }
    }
  }

  fn deliver(&self, notification: Notification<Item, Err>) {
    match notification {
      Notification::Next(value) => {
        let snapshot = self.0.rc_deref().subscribers.snapshot();
        Subscribers::broadcast(&snapshot, value);
        let pruned = self.0.rc_deref_mut().subscribers.prune();
        drop(pruned);
      }
      Notification::Error(err) => {
        let entries = self.0.rc_deref_mut().subscribers.take_all();
        for entry in entries {
          if let Some(observer) = entry.close() {
            observer.error(err.clone());
          }
        }
      }
      Notification::Complete => {
        let entries = self.0.rc_deref_mut().subscribers.take_all();
        for entry in entries {
          if let Some(observer) = entry.close() {
            observer.complete();
          }
        }
      }
    }
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.emit(Notification::Next(value)) }

  #[inline]
  fn error(self, err: Err) { self.emit(Notification::Error(err)) }

  #[inline]
  fn complete(self) { self.emit(Notification::Complete) }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let stopped = self.0.rc_deref().stopped.clone();
    match stopped {
      Some(Terminal::Error(err)) => {
        observer.error(err);
        SubjectSubscription::closed()
      }
      Some(Terminal::Complete) => {
        observer.complete();
        SubjectSubscription::closed()
      }
      None => {
        let observer: BoxObserver<Item, Err> = Box::new(observer);
        let entry = self.0.rc_deref_mut().subscribers.add(observer);
        SubjectSubscription::new(entry, self.downgrade())
      }
    }
  }
}

#[cfg(test)]
mod test {
  use bencher::{benchmark_group, Bencher};
  use crate::{prelude::*, rc::MutRc};
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn base_data_flow() {
    let i = Rc::new(Cell::new(0));
    let c_i = i.clone();
    let broadcast = Subject::<i32, ()>::default();
    broadcast.clone().subscribe(move |v| c_i.set(v * 2));
    broadcast.clone().next(1);
    assert_eq!(i.get(), 2);
  }

  #[test]
  fn delivery_follows_registration_order() {
    let log = MutRc::own(vec![]);
    let subject = Subject::<i32, ()>::default();
    for name in ["a", "b", "c"] {
      let log = log.clone();
      subject
        .clone()
        .subscribe(move |v| log.rc_deref_mut().push(format!("{name}{v}")));
    }
    subject.clone().next(1);
    assert_eq!(*log.rc_deref(), vec!["a1", "b1", "c1"]);
  }

  #[test]
  fn unsubscribe_leaves_siblings_alone() {
    let a = Rc::new(Cell::new(0));
    let b = Rc::new(Cell::new(0));
    let subject = Subject::<i32, ()>::default();
    let c_a = a.clone();
    let c_b = b.clone();
    let sub_a = subject.clone().subscribe(move |v| c_a.set(c_a.get() + v));
    subject.clone().subscribe(move |v| c_b.set(c_b.get() + v));

    let mut s = subject.clone();
    s.next(1);
    sub_a.unsubscribe();
    s.next(10);
    assert_eq!((a.get(), b.get()), (1, 11));
    assert_eq!(subject.subscriber_count(), 1);
  }

  #[test]
  fn late_subscriber_gets_terminal_only() {
    let subject = Subject::<i32, &'static str>::default();
    subject.clone().complete();

    let completed = Rc::new(Cell::new(false));
    let c_completed = completed.clone();
    let handle = subject.clone().subscribe_all(
      |_| panic!("no values after completion"),
      |_| panic!("completed, not errored"),
      move || c_completed.set(true),
    );
    assert!(completed.get());
    assert!(handle.is_closed());
    assert_eq!(subject.subscriber_count(), 0);

    let errored = Subject::<i32, &'static str>::default();
    errored.clone().error("gone");
    let err = MutRc::own(None);
    let c_err = err.clone();
    errored
      .clone()
      .subscribe_err(|_| {}, move |e| *c_err.rc_deref_mut() = Some(e));
    assert_eq!(*err.rc_deref(), Some("gone"));
  }

  #[test]
  fn next_after_complete_is_ignored() {
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    let subject = Subject::<i32, ()>::default();
    subject
      .clone()
      .subscribe(move |v| c_values.rc_deref_mut().push(v));
    let mut s = subject.clone();
    s.next(1);
    subject.clone().complete();
    s.next(2);
    assert_eq!(*values.rc_deref(), vec![1]);
  }

  #[test]
  fn reentrant_push_is_queued_not_dropped() {
    let subject = Subject::<i32, ()>::default();
    let log = MutRc::own(vec![]);

    let c_log = log.clone();
    let feedback = subject.clone();
    subject.clone().subscribe(move |v| {
      c_log.rc_deref_mut().push(format!("a{v}"));
      if v < 3 {
        feedback.clone().next(v + 1);
      }
    });
    let c_log = log.clone();
    subject
      .clone()
      .subscribe(move |v| c_log.rc_deref_mut().push(format!("b{v}")));

    subject.clone().next(1);
    // every observer sees a value before the queued one starts
    assert_eq!(*log.rc_deref(), vec!["a1", "b1", "a2", "b2", "a3", "b3"]);
  }

  #[test]
  fn unsubscribe_inside_next() {
    let subject = Subject::<i32, ()>::default();
    let values = MutRc::own(vec![]);
    let slot: MutRc<Option<SubscriptionHandle>> = MutRc::own(None);
    let c_slot = slot.clone();
    let c_values = values.clone();
    let handle = subject.clone().subscribe(move |v| {
      c_values.rc_deref_mut().push(v);
      let handle = c_slot.rc_deref_mut().take();
      if let Some(handle) = handle {
        handle.unsubscribe();
      }
    });
    *slot.rc_deref_mut() = Some(handle);
    let mut s = subject.clone();
    s.next(1);
    s.next(2);
    assert_eq!(*values.rc_deref(), vec![1]);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_subject);

  fn bench_subject(b: &mut Bencher) { b.iter(base_data_flow); }
}
