use crate::{
  observable::Observable,
  observer::{BoxObserver, Notification, Observer, SharedObserver},
  subscription::{Subscription, ZipSubscription},
};
use std::marker::PhantomData;

/// Creates an observable from a producer function.
///
/// The producer receives an [`Emitter`] and returns the teardown to run on
/// unsubscribe (`()` when there is nothing to release). The emitter may be
/// kept and used later, for example from a callback or a spawned future.
pub fn create<F, Item, Err, U>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
{
  Create::new(subscribe)
}

/// Observable created from a function.
#[derive(Clone)]
pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F, Item, Err> Create<F, Item, Err> {
  pub fn new(f: F) -> Self { Self { f, _marker: PhantomData } }
}

/// The producer side of [`create`].
///
/// Pushes are ignored once the stream terminated or the consumer
/// unsubscribed. Pushing from inside the consumer's own callback is allowed;
/// the nested notification is delivered after the current one.
pub struct Emitter<Item, Err>(
  SharedObserver<BoxObserver<Item, Err>, Item, Err>,
);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  #[inline]
  pub fn next(&self, value: Item) { self.0.emit(Notification::Next(value)) }

  #[inline]
  pub fn error(&self, err: Err) { self.0.emit(Notification::Error(err)) }

  #[inline]
  pub fn complete(&self) { self.0.emit(Notification::Complete) }

  /// `true` once nothing pushed through this emitter can be observed any
  /// more.
  pub fn is_closed(&self) -> bool { self.0.is_finished() }
}

impl<Item, Err> Subscription for Emitter<Item, Err> {
  fn unsubscribe(self) { self.0.close() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<F, Item, Err, U> Observable for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = ZipSubscription<Emitter<Item, Err>, U>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let observer: BoxObserver<Item, Err> = Box::new(observer);
    let emitter = Emitter(SharedObserver::new(observer));
    let teardown = (self.f)(emitter.clone());
    ZipSubscription::new(emitter, teardown)
  }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, subscription::ClosureSubscription};
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn create_next_complete() {
    let emitted = Rc::new(RefCell::new(vec![]));
    let emitted_clone = emitted.clone();

    observable::create(|emitter: Emitter<i32, ()>| {
      emitter.next(1);
      emitter.next(2);
      emitter.complete();
      emitter.next(3);
    })
    .subscribe(move |v| emitted_clone.borrow_mut().push(v));

    assert_eq!(*emitted.borrow(), vec![1, 2]);
  }

  #[test]
  fn create_error() {
    let error = Rc::new(RefCell::new(None));
    let error_clone = error.clone();

    observable::create(|emitter: Emitter<(), &'static str>| {
      emitter.error("oops");
    })
    .subscribe_err(|_| {}, move |e| *error_clone.borrow_mut() = Some(e));

    assert_eq!(*error.borrow(), Some("oops"));
  }

  #[test]
  fn create_teardown() {
    let unsubscribed = Rc::new(RefCell::new(false));
    let unsub_clone = unsubscribed.clone();
    let kept = Rc::new(RefCell::new(None));
    let c_kept = kept.clone();
    let emitted = Rc::new(RefCell::new(vec![]));
    let emitted_clone = emitted.clone();

    let subscription = observable::create(move |emitter: Emitter<i32, ()>| {
      emitter.next(1);
      *c_kept.borrow_mut() = Some(emitter);
      ClosureSubscription::new(move || *unsub_clone.borrow_mut() = true)
    })
    .subscribe(move |v| emitted_clone.borrow_mut().push(v));

    assert!(!*unsubscribed.borrow());
    subscription.unsubscribe();
    assert!(*unsubscribed.borrow());

    // pushes after unsubscribe go nowhere
    let emitter = kept.borrow_mut().take();
    if let Some(emitter) = emitter {
      assert!(emitter.is_closed());
      emitter.next(2);
    }
    assert_eq!(*emitted.borrow(), vec![1]);
  }
}
