use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  subscription::{MultiSubscription, Subscription},
};
use std::{cell::Cell, rc::Rc};

/// Creates an observable that forwards every value of every source, in the
/// order the sources push them.
///
/// All sources are subscribed eagerly. The result completes once every source
/// completed and fails on the first error of any source, cancelling the
/// others. Merging no source at all completes immediately.
pub fn merge<S, I>(sources: I) -> MergeOp<S>
where
  I: IntoIterator<Item = S>,
  S: Observable,
{
  MergeOp::new(sources.into_iter().collect())
}

#[derive(Clone)]
pub struct MergeOp<S> {
  sources: Vec<S>,
}

impl<S> MergeOp<S> {
  pub(crate) fn new(sources: Vec<S>) -> Self { MergeOp { sources } }
}

impl<S> Observable for MergeOp<S>
where
  S: Observable,
  S::Item: 'static,
  S::Err: 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let shared = SharedObserver::new(observer);
    let subscription = MultiSubscription::new();
    subscription.append(shared.clone());

    let remaining = Rc::new(Cell::new(self.sources.len()));
    if self.sources.is_empty() {
      shared.emit(Notification::Complete);
      return subscription;
    }
    for source in self.sources {
      if shared.is_closed() {
        break;
      }
      let unsub = source.actual_subscribe(MergeObserver {
        shared: shared.clone(),
        remaining: remaining.clone(),
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

pub struct MergeObserver<O, Item, Err> {
  shared: SharedObserver<O, Item, Err>,
  remaining: Rc<Cell<usize>>,
  subscription: MultiSubscription,
}

impl<O, Item, Err> Observer<Item, Err> for MergeObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) {
    self.shared.emit(Notification::Next(value))
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let remaining = self.remaining.get().saturating_sub(1);
    self.remaining.set(remaining);
    if remaining == 0 {
      self.shared.emit(Notification::Complete);
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.shared.is_finished() }
}
