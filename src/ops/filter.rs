use crate::{
  observable::Observable,
  observer::{forward_terminal, Observer},
  subscription::{MultiSubscription, Subscription},
};

#[derive(Clone)]
pub struct FilterOp<S, F> {
  source: S,
  filter: F,
}

impl<S, F> FilterOp<S, F> {
  pub(crate) fn new(source: S, filter: F) -> Self {
    FilterOp { source, filter }
  }
}

impl<S, F> Observable for FilterOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> bool + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(FilterObserver { observer, filter: self.filter })
  }
}

pub struct FilterObserver<O, F> {
  observer: O,
  filter: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.filter)(&value) {
      self.observer.next(value)
    }
  }

  forward_terminal!(observer);
}

#[derive(Clone)]
pub struct TryFilterOp<S, F> {
  source: S,
  filter: F,
}

impl<S, F> TryFilterOp<S, F> {
  pub(crate) fn new(source: S, filter: F) -> Self {
    TryFilterOp { source, filter }
  }
}

impl<S, F> Observable for TryFilterOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> Result<bool, S::Err> + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let upstream = MultiSubscription::new();
    let unsub = self.source.actual_subscribe(TryFilterObserver {
      observer: Some(observer),
      filter: self.filter,
      upstream: upstream.clone(),
    });
    upstream.append(unsub);
    upstream
  }
}

pub struct TryFilterObserver<O, F> {
  observer: Option<O>,
  filter: F,
  upstream: MultiSubscription,
}

impl<Item, Err, O, F> Observer<Item, Err> for TryFilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> Result<bool, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.filter)(&value) {
      Ok(true) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(value);
        }
      }
      Ok(false) => {}
      Err(err) => {
        if let Some(observer) = self.observer.take() {
          observer.error(err);
        }
        self.upstream.clone().unsubscribe();
      }
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
