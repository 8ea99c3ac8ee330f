use crate::{
  observable::Observable,
  observer::{forward_terminal, Observer},
  subscription::{MultiSubscription, Subscription},
};

#[derive(Clone)]
pub struct MapOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> MapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { MapOp { source, func } }
}

impl<S, F, B> Observable for MapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> B + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(MapObserver { observer, func: self.func })
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  forward_terminal!(observer);
}

#[derive(Clone)]
pub struct TryMapOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> TryMapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { TryMapOp { source, func } }
}

impl<S, F, B> Observable for TryMapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Result<B, S::Err> + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + 'static,
  {
    let upstream = MultiSubscription::new();
    let unsub = self.source.actual_subscribe(TryMapObserver {
      observer: Some(observer),
      func: self.func,
      upstream: upstream.clone(),
    });
    upstream.append(unsub);
    upstream
  }
}

/// A failing user function ends the stream with its error and cancels the
/// upstream.
pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: MultiSubscription,
}

impl<O, F> TryMapObserver<O, F> {
  fn fail<Item, Err>(&mut self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    if let Some(observer) = self.observer.take() {
      observer.error(err);
    }
    self.upstream.clone().unsubscribe();
  }
}

impl<Item, Err, O, F, B> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(v);
        }
      }
      Err(err) => self.fail::<B, Err>(err),
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

#[derive(Clone)]
pub struct MapErrOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> MapErrOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { MapErrOp { source, func } }
}

impl<S, F, E> Observable for MapErrOp<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> E + 'static,
{
  type Item = S::Item;
  type Err = E;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, E> + 'static,
  {
    self
      .source
      .actual_subscribe(MapErrObserver { observer, func: self.func })
  }
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, E> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, E>,
  F: FnOnce(Err) -> E,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error((self.func)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use bencher::{benchmark_group, Bencher};
  use crate::{prelude::*, rc::MutRc};
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn primitive_type() {
    let i = Rc::new(Cell::new(0));
    let c_i = i.clone();
    observable::from_iter(100..101)
      .map(|v| v * 2)
      .subscribe(move |v| c_i.set(c_i.get() + v));
    assert_eq!(i.get(), 200);
  }

  #[test]
  fn map_types_mixed() {
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    observable::from_iter(vec!['a', 'b', 'c'])
      .map(|_| 1)
      .map(|v| v as f32 / 2.)
      .subscribe(move |v| c_values.rc_deref_mut().push(v));
    assert_eq!(*values.rc_deref(), vec![0.5, 0.5, 0.5]);
  }

  #[test]
  fn try_map_error_stops_upstream() {
    let subject = Subject::<i32, String>::default();
    let values = MutRc::own(vec![]);
    let err = MutRc::own(None);
    let c_values = values.clone();
    let c_err = err.clone();
    subject
      .clone()
      .try_map(|v| if v < 3 { Ok(v * 2) } else { Err(format!("too big: {v}")) })
      .subscribe_err(
        move |v| c_values.rc_deref_mut().push(v),
        move |e| *c_err.rc_deref_mut() = Some(e),
      );

    let mut s = subject.clone();
    s.next(1);
    s.next(3);
    s.next(2);
    assert_eq!(*values.rc_deref(), vec![2]);
    assert_eq!(err.rc_deref().as_deref(), Some("too big: 3"));
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn map_err_converts() {
    let err = MutRc::own(None);
    let c_err = err.clone();
    observable::throw_err::<i32, _>(7)
      .map_err(|code| format!("code {code}"))
      .subscribe_err(|_| {}, move |e| *c_err.rc_deref_mut() = Some(e));
    assert_eq!(err.rc_deref().as_deref(), Some("code 7"));
  }

  #[test]
  fn infallible_widens_to_any_error() {
    let done = Rc::new(Cell::new(false));
    let c_done = done.clone();
    observable::of(1)
      .map_err(|e| -> String { match e {} })
      .subscribe_all(|_| {}, |_: String| {}, move || c_done.set(true));
    assert!(done.get());
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_map);

  fn bench_map(b: &mut Bencher) { b.iter(primitive_type); }
}
