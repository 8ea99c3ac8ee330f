use crate::{
  observable::Observable,
  observer::{forward_terminal, Observer},
};

#[derive(Clone)]
pub struct TapOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> TapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { TapOp { source, func } }
}

impl<S, F> Observable for TapOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) + 'static,
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
      .actual_subscribe(TapObserver { observer, func: self.func })
  }
}

pub struct TapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TapObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item),
{
  fn next(&mut self, value: Item) {
    (self.func)(&value);
    self.observer.next(value);
  }

  forward_terminal!(observer);
}
