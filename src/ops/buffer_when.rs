use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  rc::MutRc,
  subscription::{MultiSubscription, Subscription},
};

/// Buffers the source values until `boundaries` emits.
///
/// Every boundary value emits the current buffer, even an empty one, and
/// starts a new buffer. An empty batch therefore means nothing happened
/// since the previous boundary. When the source completes, a non-empty
/// buffer is emitted before the completion and the boundary subscription is
/// released. An empty buffer is dropped at that point, unlike the batch a
/// boundary would emit, so completion is never mistaken for an idle window.
/// A completing boundary stream just stops the batches.
#[derive(Clone)]
pub struct BufferWhenOp<S, B> {
  source: S,
  boundaries: B,
}

impl<S, B> BufferWhenOp<S, B> {
  pub(crate) fn new(source: S, boundaries: B) -> Self {
    BufferWhenOp { source, boundaries }
  }
}

impl<S, B> Observable for BufferWhenOp<S, B>
where
  S: Observable,
  B: Observable<Err = S::Err>,
  S::Item: 'static,
  S::Err: 'static,
{
  type Item = Vec<S::Item>;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Vec<S::Item>, S::Err> + 'static,
  {
    let shared = SharedObserver::new(observer);
    let subscription = MultiSubscription::new();
    let buffer = MutRc::own(vec![]);
    subscription.append(shared.clone());

    let unsub = self.source.actual_subscribe(BufferWhenObserver {
      shared: shared.clone(),
      buffer: buffer.clone(),
      subscription: subscription.clone(),
    });
    subscription.append(unsub);
    if !shared.is_closed() {
      let unsub = self.boundaries.actual_subscribe(BoundaryObserver {
        shared,
        buffer,
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

pub struct BufferWhenObserver<O, Item, Err> {
  shared: SharedObserver<O, Vec<Item>, Err>,
  buffer: MutRc<Vec<Item>>,
  subscription: MultiSubscription,
}

impl<O, Item, Err> Observer<Item, Err> for BufferWhenObserver<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) { self.buffer.rc_deref_mut().push(value) }

  fn error(self, err: Err) {
    self.buffer.rc_deref_mut().clear();
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let rest = std::mem::take(&mut *self.buffer.rc_deref_mut());
    if !rest.is_empty() {
      self.shared.emit(Notification::Next(rest));
    }
    self.shared.emit(Notification::Complete);
    self.subscription.unsubscribe();
  }

  fn is_finished(&self) -> bool { self.shared.is_finished() }
}

pub struct BoundaryObserver<O, Item, Err> {
  shared: SharedObserver<O, Vec<Item>, Err>,
  buffer: MutRc<Vec<Item>>,
  subscription: MultiSubscription,
}

impl<O, Item, Err, BItem> Observer<BItem, Err>
  for BoundaryObserver<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, _: BItem) {
    let batch = std::mem::take(&mut *self.buffer.rc_deref_mut());
    self.shared.emit(Notification::Next(batch));
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {}

  fn is_finished(&self) -> bool { self.shared.is_finished() }
}
