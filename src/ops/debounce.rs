use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  rc::MutRc,
  scheduler::Scheduler,
  subscription::{
    MultiSubscription, SerialSubscription, Subscription, ZipSubscription,
  },
};
use std::time::Duration;

#[derive(Clone)]
pub struct DebounceOp<S, SD> {
  source: S,
  duration: Duration,
  scheduler: SD,
}

impl<S, SD> DebounceOp<S, SD> {
  pub(crate) fn new(source: S, duration: Duration, scheduler: SD) -> Self {
    DebounceOp { source, duration, scheduler }
  }
}

impl<S, SD> Observable for DebounceOp<S, SD>
where
  S: Observable,
  S::Item: 'static,
  S::Err: 'static,
  SD: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = ZipSubscription<MultiSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let Self { source, duration, scheduler } = self;
    let shared = SharedObserver::new(observer);
    let subscription = MultiSubscription::new();
    let timer = SerialSubscription::new();
    subscription.append(shared.clone());

    let unsub = source.actual_subscribe(DebounceObserver {
      shared,
      trailing_value: MutRc::own(None),
      timer: timer.clone(),
      subscription: subscription.clone(),
      duration,
      scheduler,
    });
    subscription.append(unsub);
    ZipSubscription::new(subscription, timer)
  }
}

pub struct DebounceObserver<O, Item, Err, SD> {
  shared: SharedObserver<O, Item, Err>,
  trailing_value: MutRc<Option<Item>>,
  timer: SerialSubscription,
  subscription: MultiSubscription,
  duration: Duration,
  scheduler: SD,
}

impl<O, Item, Err, SD> Observer<Item, Err>
  for DebounceObserver<O, Item, Err, SD>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    *self.trailing_value.rc_deref_mut() = Some(value);
    let shared = self.shared.clone();
    let trailing_value = self.trailing_value.clone();
    let handle = self.scheduler.schedule(
      move || {
        let value = trailing_value.rc_deref_mut().take();
        if let Some(value) = value {
          shared.emit(Notification::Next(value));
        }
      },
      self.duration,
    );
    self.timer.replace(handle);
  }

  fn error(self, err: Err) {
    self.timer.unsubscribe();
    self.trailing_value.rc_deref_mut().take();
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    self.timer.unsubscribe();
    let value = self.trailing_value.rc_deref_mut().take();
    if let Some(value) = value {
      self.shared.emit(Notification::Next(value));
    }
    self.shared.emit(Notification::Complete);
    self.subscription.unsubscribe();
  }

  fn is_finished(&self) -> bool { self.shared.is_finished() }
}
