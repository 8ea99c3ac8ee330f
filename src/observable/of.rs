use crate::{observable::Observable, observer::Observer};
use std::{convert::Infallible, marker::PhantomData};

/// Creates an observable that emits one value, then completes.
///
/// Value sources never fail, so their error type is [`Infallible`]; use
/// `map_err(|e| match e {})` to join them with fallible streams.
///
/// # Example
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::of(123).subscribe(|v| println!("{}", v));
/// ```
pub fn of<Item>(value: Item) -> ObservableOf<Item> { ObservableOf(value) }

#[derive(Clone)]
pub struct ObservableOf<Item>(Item);

impl<Item> Observable for ObservableOf<Item> {
  type Item = Item;
  type Err = Infallible;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + 'static,
  {
    observer.next(self.0);
    observer.complete();
  }
}

/// Creates an observable that emits every value of `iter` synchronously on
/// subscribe, then completes.
///
/// Emission stops early once the observer reports it is finished.
pub fn from_iter<I: IntoIterator>(iter: I) -> ObservableIter<I> {
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<I>(I);

impl<I: IntoIterator> Observable for ObservableIter<I> {
  type Item = I::Item;
  type Err = Infallible;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<I::Item, Infallible> + 'static,
  {
    for v in self.0 {
      if observer.is_finished() {
        return;
      }
      observer.next(v);
    }
    observer.complete();
  }
}

/// Creates an observable that completes without emitting.
pub fn empty<Item>() -> EmptyObservable<Item> { EmptyObservable(PhantomData) }

pub struct EmptyObservable<Item>(PhantomData<Item>);

impl<Item> Clone for EmptyObservable<Item> {
  fn clone(&self) -> Self { EmptyObservable(PhantomData) }
}

impl<Item> Observable for EmptyObservable<Item> {
  type Item = Item;
  type Err = Infallible;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + 'static,
  {
    observer.complete();
  }
}

/// Creates an observable that never emits and never terminates.
pub fn never<Item>() -> NeverObservable<Item> { NeverObservable(PhantomData) }

pub struct NeverObservable<Item>(PhantomData<Item>);

impl<Item> Clone for NeverObservable<Item> {
  fn clone(&self) -> Self { NeverObservable(PhantomData) }
}

impl<Item> Observable for NeverObservable<Item> {
  type Item = Item;
  type Err = Infallible;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + 'static,
  {
    drop(observer);
  }
}

/// Creates an observable that fails with `err` as soon as it is subscribed.
pub fn throw_err<Item, Err>(err: Err) -> ThrowObservable<Item, Err> {
  ThrowObservable(err, PhantomData)
}

pub struct ThrowObservable<Item, Err>(Err, PhantomData<Item>);

impl<Item, Err: Clone> Clone for ThrowObservable<Item, Err> {
  fn clone(&self) -> Self { ThrowObservable(self.0.clone(), PhantomData) }
}

impl<Item, Err> Observable for ThrowObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.error(self.0);
  }
}
