use crate::{
  observable::Observable,
  observer::{BoxObserver, Observer},
  subscription::{BoxSubscription, Subscription},
};

/// Object-safe mirror of [`Observable`], fixed to boxed observers.
pub trait DynObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, observer: BoxObserver<Item, Err>)
    -> BoxSubscription;
}

impl<T> DynObservable<T::Item, T::Err> for T
where
  T: Observable,
  T::Item: 'static,
  T::Err: 'static,
{
  fn box_subscribe(
    self: Box<Self>,
    observer: BoxObserver<T::Item, T::Err>,
  ) -> BoxSubscription {
    (*self).actual_subscribe(observer).into_boxed()
  }
}

/// An observable with its concrete type erased, created by
/// [`box_it`](crate::observable::ObservableExt::box_it).
///
/// Useful to keep heterogeneous pipelines in one collection, for example
/// the event sources handed to `merge`.
pub struct BoxObservable<Item, Err>(Box<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err> + 'static,
    Item: 'static,
    Err: 'static,
  {
    BoxObservable(Box::new(source))
  }
}

impl<Item: 'static, Err: 'static> Observable for BoxObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = BoxSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.box_subscribe(Box::new(observer))
  }
}
