use crate::rc::MutRc;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

/// Subscription returned from `Observable::actual_subscribe` to allow
/// unsubscribing.
pub trait Subscription {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before complete is called).
  ///
  /// Cancellation is idempotent: unsubscribing an already closed
  /// subscription does nothing.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }

  fn into_boxed(self) -> BoxSubscription
  where
    Self: Sized + 'static,
  {
    Box::new(self)
  }
}

/// Object-safe mirror of [`Subscription`].
pub trait DynSubscription {
  fn box_unsubscribe(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T: Subscription> DynSubscription for T {
  #[inline]
  fn box_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

pub type BoxSubscription = Box<dyn DynSubscription>;

impl Subscription for Box<dyn DynSubscription> {
  #[inline]
  fn unsubscribe(self) { self.box_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }

  fn into_boxed(self) -> BoxSubscription { self }
}

impl Debug for Box<dyn DynSubscription> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// Nothing to tear down; sources that finish during subscribe return this.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  fn unsubscribe(self) {
    if let Some(s) = self {
      s.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, |s| s.is_closed()) }
}

/// Two subscriptions that live and die together.
#[derive(Clone, Debug)]
pub struct ZipSubscription<A, B> {
  a: A,
  b: B,
}

impl<A, B> ZipSubscription<A, B> {
  pub fn new(a: A, b: B) -> Self { Self { a, b } }
}

impl<A, B> Subscription for ZipSubscription<A, B>
where
  A: Subscription,
  B: Subscription,
{
  fn unsubscribe(self) {
    self.a.unsubscribe();
    self.b.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.a.is_closed() && self.b.is_closed() }
}

/// A cloneable group of teardowns; unsubscribing the group unsubscribes every
/// member.
#[derive(Clone, Default)]
pub struct MultiSubscription(MutRc<MultiInner>);

#[derive(Default)]
struct MultiInner {
  closed: bool,
  teardown: SmallVec<[BoxSubscription; 2]>,
}

impl MultiSubscription {
  pub fn new() -> Self { Self::default() }

  /// Add a teardown to the group. If the group is already closed the
  /// subscription is unsubscribed right away.
  pub fn append<S: Subscription + 'static>(&self, subscription: S) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|s| !s.is_closed());
      inner.teardown.push(subscription.into_boxed());
    }
  }

  /// Number of live teardowns held by the group.
  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }
}

impl Subscription for MultiSubscription {
  fn unsubscribe(self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for s in teardown {
      s.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for MultiSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("MultiSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

/// Holds at most one inner subscription; replacing it cancels the previous
/// one.
#[derive(Clone, Default)]
pub struct SerialSubscription(MutRc<SerialInner>);

#[derive(Default)]
struct SerialInner {
  closed: bool,
  current: Option<BoxSubscription>,
}

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn replace<S: Subscription + 'static>(&self, subscription: S) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      let old = inner.current.replace(subscription.into_boxed());
      drop(inner);
      old.unsubscribe();
    }
  }

  /// Cancel the current inner subscription, leaving the slot open for the
  /// next one.
  pub fn cancel_current(&self) {
    let current = self.0.rc_deref_mut().current.take();
    current.unsubscribe();
  }

  pub fn has_current(&self) -> bool {
    self.0.rc_deref().current.as_ref().map_or(false, |s| !s.is_closed())
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) {
    let current = {
      let mut inner = self.0.rc_deref_mut();
      inner.closed = true;
      inner.current.take()
    };
    current.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

/// Runs a closure on unsubscribe.
pub struct ClosureSubscription<F>(F);

impl<F: FnOnce()> ClosureSubscription<F> {
  pub fn new(f: F) -> Self { Self(f) }
}

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  fn unsubscribe(self) { (self.0)() }

  fn is_closed(&self) -> bool { false }
}

/// The handle a terminal `subscribe*` call returns.
///
/// Clones refer to the same subscription; cancelling through any of them is
/// idempotent.
#[derive(Clone)]
pub struct SubscriptionHandle(MutRc<Option<BoxSubscription>>);

impl SubscriptionHandle {
  pub fn new<S: Subscription + 'static>(subscription: S) -> Self {
    Self(MutRc::own(Some(subscription.into_boxed())))
  }
}

impl Subscription for SubscriptionHandle {
  fn unsubscribe(self) {
    let inner = self.0.rc_deref_mut().take();
    inner.unsubscribe();
  }

  fn is_closed(&self) -> bool {
    self
      .0
      .try_rc_deref()
      .map_or(false, |s| s.as_ref().map_or(true, |s| s.is_closed()))
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// This structure is created by the
/// [`unsubscribe_when_dropped`](Subscription::unsubscribe_when_dropped)
/// method on [`Subscription`].
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Release the subscription without unsubscribing it.
  pub fn forget(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(s) = self.0.take() {
      s.unsubscribe()
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::{cell::Cell, rc::Rc};

  fn counter() -> (Rc<Cell<usize>>, impl Subscription + Clone + 'static) {
    let hits = Rc::new(Cell::new(0));
    let c_hits = hits.clone();
    let handle = SubscriptionHandle::new(ClosureSubscription::new(move || {
      c_hits.set(c_hits.get() + 1)
    }));
    (hits, handle)
  }

  #[test]
  fn handle_unsubscribe_is_idempotent() {
    let (hits, handle) = counter();
    assert!(!handle.is_closed());
    handle.clone().unsubscribe();
    handle.clone().unsubscribe();
    assert!(handle.is_closed());
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn multi_append_after_close_unsubscribes_immediately() {
    let multi = MultiSubscription::new();
    let (a, sa) = counter();
    multi.append(sa);
    multi.clone().unsubscribe();
    assert_eq!(a.get(), 1);

    let (b, sb) = counter();
    multi.append(sb);
    assert_eq!(b.get(), 1);
    assert_eq!(multi.teardown_size(), 0);
  }

  #[test]
  fn multi_drops_closed_members() {
    let multi = MultiSubscription::new();
    let (_, sa) = counter();
    multi.append(sa.clone());
    sa.unsubscribe();
    let (_, sb) = counter();
    multi.append(sb);
    assert_eq!(multi.teardown_size(), 1);
  }

  #[test]
  fn serial_replace_cancels_previous() {
    let serial = SerialSubscription::new();
    let (a, sa) = counter();
    let (b, sb) = counter();
    serial.replace(sa);
    serial.replace(sb);
    assert_eq!(a.get(), 1);
    assert_eq!(b.get(), 0);
    assert!(serial.has_current());

    serial.cancel_current();
    assert_eq!(b.get(), 1);
    assert!(!serial.has_current());
    assert!(!serial.is_closed());
  }

  #[test]
  fn serial_replace_after_close() {
    let serial = SerialSubscription::new();
    serial.clone().unsubscribe();
    let (a, sa) = counter();
    serial.replace(sa);
    assert_eq!(a.get(), 1);
    assert!(!serial.has_current());
  }

  #[test]
  fn zip_closes_both() {
    let (a, sa) = counter();
    let (b, sb) = counter();
    ZipSubscription::new(sa, sb).unsubscribe();
    assert_eq!((a.get(), b.get()), (1, 1));
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let (hits, handle) = counter();
    {
      let _guard = handle.clone().unsubscribe_when_dropped();
    }
    assert_eq!(hits.get(), 1);
    assert!(handle.is_closed());

    let (hits, handle) = counter();
    let guard = handle.unsubscribe_when_dropped();
    let _ = guard.forget();
    assert_eq!(hits.get(), 0);
  }
}
