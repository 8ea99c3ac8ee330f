//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use crate::subscription::Subscription;
use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  ///
  /// This consumes the observer, as no more values can be emitted after an
  /// error
  fn error(self, err: Err);

  /// Handle completion of the observable
  ///
  /// This consumes the observer, as no more values can be emitted after
  /// completion
  fn complete(self);

  /// Returns `true` once the observer will not accept more values.
  ///
  /// Synchronous sources poll this to stop producing early, for example when
  /// a downstream `take` has already been satisfied.
  fn is_finished(&self) -> bool;
}

/// A single push notification, used wherever deliveries have to be queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  /// Deliver this notification to `observer`, consuming it on a terminal one.
  pub fn accept<O>(self, observer: &mut Option<O>)
  where
    O: Observer<Item, Err>,
  {
    match self {
      Notification::Next(value) => {
        if let Some(o) = observer.as_mut() {
          o.next(value);
        }
      }
      Notification::Error(err) => {
        if let Some(o) = observer.take() {
          o.error(err);
        }
      }
      Notification::Complete => {
        if let Some(o) = observer.take() {
          o.complete();
        }
      }
    }
  }

  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }
}

/// Implements the terminal half of [`Observer`] by forwarding to a field.
///
/// For operator observers that only intercept `next`. Expects the impl to
/// name its error type parameter `Err`.
macro_rules! forward_terminal {
  ($field:ident) => {
    #[inline]
    fn error(self, err: Err) { self.$field.error(err) }

    #[inline]
    fn complete(self) { self.$field.complete() }

    #[inline]
    fn is_finished(&self) -> bool { self.$field.is_finished() }
  };
}
pub(crate) use forward_terminal;

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (Box<dyn Observer>)
///
/// Standard Observer trait is not object-safe because the terminal methods
/// take `self` by value. DynObserver mirrors the interface but adapts it for
/// vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_finished(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err); }
  fn box_complete(self: Box<Self>) { (*self).complete(); }
  fn box_is_finished(&self) -> bool { self.is_finished() }
}

/// A type-erased observer.
pub type BoxObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err> Observer<Item, Err> for Box<dyn DynObserver<Item, Err>> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).box_is_finished() }
}

// ============================================================================
// Closure observer
// ============================================================================

/// Observer assembled from three closures; what the `subscribe*` methods
/// build for the caller.
pub struct FnObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> FnObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    FnObserver { next, error, complete }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for FnObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn error(self, err: Err) { (self.error)(err) }

  #[inline]
  fn complete(self) { (self.complete)() }

  #[inline]
  fn is_finished(&self) -> bool { false }
}

// ============================================================================
// SharedObserver - one downstream fed by several upstream inputs
// ============================================================================

/// A cloneable handle to one downstream observer.
///
/// Operators with more than one upstream (merge, combine_latest, switch_map,
/// timers in debounce and buffer_when) feed the same downstream from several
/// places. Deliveries are serialized: a notification that arrives while
/// another one is still being delivered (a re-entrant push) is queued and
/// handed over once the current delivery returns, so the downstream never
/// sees interleaved or lost notifications.
pub struct SharedObserver<O, Item, Err>(Rc<SharedInner<O, Item, Err>>);

struct SharedInner<O, Item, Err> {
  observer: RefCell<Option<O>>,
  pending: RefCell<VecDeque<Notification<Item, Err>>>,
  draining: Cell<bool>,
  closed: Cell<bool>,
}

impl<O, Item, Err> Clone for SharedObserver<O, Item, Err> {
  fn clone(&self) -> Self { SharedObserver(self.0.clone()) }
}

impl<O, Item, Err> SharedObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub fn new(observer: O) -> Self {
    SharedObserver(Rc::new(SharedInner {
      observer: RefCell::new(Some(observer)),
      pending: RefCell::new(VecDeque::new()),
      draining: Cell::new(false),
      closed: Cell::new(false),
    }))
  }

  pub fn emit(&self, notification: Notification<Item, Err>) {
    if self.0.closed.get() {
      return;
    }
    self.0.pending.borrow_mut().push_back(notification);
    if self.0.draining.get() {
      return;
    }
    self.0.draining.set(true);
    loop {
      if self.0.closed.get() {
        self.0.pending.borrow_mut().clear();
        let observer = self.0.observer.borrow_mut().take();
        drop(observer);
        break;
      }
      let next = self.0.pending.borrow_mut().pop_front();
      let Some(notification) = next else { break };
      match notification {
        Notification::Next(value) => {
          if let Some(o) = self.0.observer.borrow_mut().as_mut() {
            o.next(value);
          }
        }
        terminal => {
          self.0.closed.set(true);
          let mut observer = self.0.observer.borrow_mut().take();
          terminal.accept(&mut observer);
        }
      }
    }
    self.0.draining.set(false);
  }

  /// Drop the downstream observer without notifying it.
  ///
  /// Safe to call from inside a delivery; the observer is then released as
  /// soon as that delivery returns.
  pub fn close(&self) {
    self.0.closed.set(true);
    if self.0.draining.get() {
      return;
    }
    self.0.pending.borrow_mut().clear();
    let observer = self.0.observer.borrow_mut().take();
    drop(observer);
  }

  /// `true` once a terminal notification was delivered or `close` was called.
  pub fn is_closed(&self) -> bool { self.0.closed.get() }
}

impl<O, Item, Err> Observer<Item, Err> for SharedObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.emit(Notification::Next(value)) }

  #[inline]
  fn error(self, err: Err) { self.emit(Notification::Error(err)) }

  #[inline]
  fn complete(self) { self.emit(Notification::Complete) }

  fn is_finished(&self) -> bool {
    self.0.closed.get()
      || self
        .0
        .observer
        .try_borrow()
        .map_or(false, |o| o.as_ref().map_or(true, |o| o.is_finished()))
  }
}

/// Unsubscribing closes the shared downstream; operators add it to their
/// teardown so that nothing reaches the observer once the subscription is
/// cancelled.
impl<O, Item, Err> Subscription for SharedObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn unsubscribe(self) { self.close() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.closed.get() }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::rc::MutRc;

  fn recorder(
    log: &MutRc<Vec<String>>,
  ) -> FnObserver<impl FnMut(i32), impl FnOnce(&'static str), impl FnOnce()>
  {
    let n = log.clone();
    let e = log.clone();
    let c = log.clone();
    FnObserver::new(
      move |v: i32| n.rc_deref_mut().push(format!("next {v}")),
      move |err: &'static str| e.rc_deref_mut().push(format!("error {err}")),
      move || c.rc_deref_mut().push("complete".to_owned()),
    )
  }

  #[test]
  fn boxed_observer_forwards() {
    let log = MutRc::own(vec![]);
    let mut boxed: BoxObserver<i32, &'static str> = Box::new(recorder(&log));
    boxed.next(1);
    assert!(!boxed.is_finished());
    boxed.error("boom");
    assert_eq!(*log.rc_deref(), vec!["next 1", "error boom"]);
  }

  #[test]
  fn notification_accept_consumes_on_terminal() {
    let log = MutRc::own(vec![]);
    let mut observer = Some(recorder(&log));
    Notification::<i32, &'static str>::Next(1).accept(&mut observer);
    Notification::<i32, &'static str>::Complete.accept(&mut observer);
    Notification::<i32, &'static str>::Next(2).accept(&mut observer);
    assert!(observer.is_none());
    assert_eq!(*log.rc_deref(), vec!["next 1", "complete"]);
  }

  #[test]
  fn shared_observer_stops_after_terminal() {
    let log = MutRc::own(vec![]);
    let shared: SharedObserver<_, i32, &'static str> =
      SharedObserver::new(recorder(&log));
    let mut a = shared.clone();
    let b = shared.clone();
    a.next(1);
    b.complete();
    a.next(2);
    assert!(shared.is_closed());
    assert_eq!(*log.rc_deref(), vec!["next 1", "complete"]);
  }

  #[test]
  fn shared_observer_queues_reentrant_delivery() {
    let log = MutRc::own(vec![]);
    let slot: MutRc<Option<SharedObserver<BoxObserver<i32, ()>, i32, ()>>> =
      MutRc::own(None);
    let inner_slot = slot.clone();
    let inner_log = log.clone();
    let observer = FnObserver::new(
      move |v: i32| {
        inner_log.rc_deref_mut().push(v);
        if v == 1 {
          let shared = inner_slot.rc_deref().clone();
          if let Some(mut shared) = shared {
            shared.next(2);
          }
          inner_log.rc_deref_mut().push(10);
        }
      },
      |_: ()| {},
      || {},
    );
    let boxed: BoxObserver<i32, ()> = Box::new(observer);
    let shared = SharedObserver::new(boxed);
    *slot.rc_deref_mut() = Some(shared.clone());
    shared.clone().next(1);
    // the nested value is handed over after the outer delivery returned
    assert_eq!(*log.rc_deref(), vec![1, 10, 2]);
    slot.rc_deref_mut().take();
  }

  #[test]
  fn close_inside_delivery_stops_the_rest() {
    let log = MutRc::own(vec![]);
    let slot: MutRc<Option<SharedObserver<BoxObserver<i32, ()>, i32, ()>>> =
      MutRc::own(None);
    let inner_slot = slot.clone();
    let inner_log = log.clone();
    let observer = FnObserver::new(
      move |v: i32| {
        inner_log.rc_deref_mut().push(v);
        let shared = inner_slot.rc_deref().clone();
        if let Some(mut shared) = shared {
          shared.next(v + 1);
          shared.close();
        }
      },
      |_: ()| {},
      || {},
    );
    let boxed: BoxObserver<i32, ()> = Box::new(observer);
    let shared = SharedObserver::new(boxed);
    *slot.rc_deref_mut() = Some(shared.clone());
    shared.clone().next(1);
    assert!(shared.is_closed());
    assert_eq!(*log.rc_deref(), vec![1]);
    slot.rc_deref_mut().take();
  }
}
