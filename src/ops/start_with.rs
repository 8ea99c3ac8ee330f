use crate::{observable::Observable, observer::Observer};

/// Emits the given values synchronously on subscribe, then mirrors the
/// source.
///
/// Commonly used to seed an input of `combine_latest` so the combination is
/// not starved until that input emits on its own.
pub struct StartWithOp<S: Observable> {
  source: S,
  values: Vec<S::Item>,
}

impl<S> Clone for StartWithOp<S>
where
  S: Observable + Clone,
  S::Item: Clone,
{
  fn clone(&self) -> Self {
    StartWithOp { source: self.source.clone(), values: self.values.clone() }
  }
}

impl<S: Observable> StartWithOp<S> {
  pub(crate) fn new(source: S, values: Vec<S::Item>) -> Self {
    StartWithOp { source, values }
  }
}

impl<S: Observable> Observable for StartWithOp<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = Option<S::Unsub>;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    for v in self.values {
      if observer.is_finished() {
        break;
      }
      observer.next(v);
    }
    if observer.is_finished() {
      None
    } else {
      Some(self.source.actual_subscribe(observer))
    }
  }
}
