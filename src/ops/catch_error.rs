use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{MultiSubscription, Subscription},
};

/// On a source error, continues with the observable built by `handler`.
///
/// Values already emitted stay emitted; the fallback's values follow and its
/// termination becomes the termination of the result. Cancelling the result
/// cancels whichever of the two is running.
#[derive(Clone)]
pub struct CatchErrorOp<S, F> {
  source: S,
  handler: F,
}

impl<S, F> CatchErrorOp<S, F> {
  pub(crate) fn new(source: S, handler: F) -> Self {
    CatchErrorOp { source, handler }
  }
}

impl<S, F, R> Observable for CatchErrorOp<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> R + 'static,
  R: Observable<Item = S::Item>,
{
  type Item = S::Item;
  type Err = R::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, R::Err> + 'static,
  {
    let subscription = MultiSubscription::new();
    let unsub = self.source.actual_subscribe(CatchErrorObserver {
      observer,
      handler: self.handler,
      subscription: subscription.clone(),
    });
    subscription.append(unsub);
    subscription
  }
}

pub struct CatchErrorObserver<O, F> {
  observer: O,
  handler: F,
  subscription: MultiSubscription,
}

impl<O, F, R, Item, Err> Observer<Item, Err> for CatchErrorObserver<O, F>
where
  O: Observer<Item, R::Err> + 'static,
  F: FnOnce(Err) -> R,
  R: Observable<Item = Item>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    if self.subscription.is_closed() {
      return;
    }
    let fallback = (self.handler)(err);
    let unsub = fallback.actual_subscribe(self.observer);
    self.subscription.append(unsub);
  }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
