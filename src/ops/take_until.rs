use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  subscription::{MultiSubscription, Subscription},
};

/// Mirrors the source until the notifier emits, then completes.
///
/// Both subscriptions are released on the first notifier value and when
/// either side fails. A notifier error is forwarded downstream. A notifier
/// that completes without a value never stops the source.
#[derive(Clone)]
pub struct TakeUntilOp<S, N> {
  source: S,
  notifier: N,
}

impl<S, N> TakeUntilOp<S, N> {
  pub(crate) fn new(source: S, notifier: N) -> Self {
    TakeUntilOp { source, notifier }
  }
}

impl<S, N> Observable for TakeUntilOp<S, N>
where
  S: Observable,
  S::Item: 'static,
  S::Err: 'static,
  N: Observable<Err = S::Err>,
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

    let unsub = self.notifier.actual_subscribe(StopSignal {
      shared: shared.clone(),
      subscription: subscription.clone(),
    });
    subscription.append(unsub);
    if !shared.is_closed() {
      let unsub = self.source.actual_subscribe(TakeUntilObserver {
        shared,
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

pub struct TakeUntilObserver<O, Item, Err> {
  shared: SharedObserver<O, Item, Err>,
  subscription: MultiSubscription,
}

impl<O, Item, Err> Observer<Item, Err> for TakeUntilObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    self.shared.emit(Notification::Next(value))
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    self.shared.emit(Notification::Complete);
    self.subscription.unsubscribe();
  }

  fn is_finished(&self) -> bool { self.shared.is_finished() }
}

pub struct StopSignal<O, Item, Err> {
  shared: SharedObserver<O, Item, Err>,
  subscription: MultiSubscription,
}

impl<O, Item, Err, NItem> Observer<NItem, Err> for StopSignal<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: NItem) {
    if self.shared.is_closed() {
      return;
    }
    self.shared.emit(Notification::Complete);
    self.subscription.clone().unsubscribe();
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    if !self.shared.is_closed() {
      tracing::debug!("take_until notifier completed without a value");
    }
  }

  fn is_finished(&self) -> bool { self.shared.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, rc::MutRc};
  use std::{cell::Cell, convert::Infallible, rc::Rc, time::Duration};

  #[test]
  fn stops_on_notifier_and_releases_both() {
    let source = Subject::<i32, ()>::default();
    let destroy = Subject::<(), ()>::default();
    let values = MutRc::own(vec![]);
    let completed = Rc::new(Cell::new(false));
    let c_values = values.clone();
    let c_completed = completed.clone();

    source.clone().take_until(destroy.clone()).subscribe_all(
      move |v| c_values.rc_deref_mut().push(v),
      |_| {},
      move || c_completed.set(true),
    );

    let mut s = source.clone();
    s.next(1);
    destroy.clone().next(());
    s.next(2);

    assert_eq!(*values.rc_deref(), vec![1]);
    assert!(completed.get());
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(destroy.subscriber_count(), 0);
  }

  #[test]
  fn notifier_firing_first_skips_source() {
    let subscribed = Rc::new(Cell::new(false));
    let c_subscribed = subscribed.clone();
    let source = observable::create(move |emitter: Emitter<i32, Infallible>| {
      c_subscribed.set(true);
      emitter.next(1);
    });
    source
      .take_until(observable::of(()))
      .subscribe(|_| panic!("source must not run"));
    assert!(!subscribed.get());
  }

  #[test]
  fn notifier_error_ends_the_stream() {
    let source = Subject::<i32, &'static str>::default();
    let destroy = Subject::<(), &'static str>::default();
    let values = MutRc::own(vec![]);
    let err = MutRc::own(None);
    let c_values = values.clone();
    let c_err = err.clone();

    source.clone().take_until(destroy.clone()).subscribe_err(
      move |v| c_values.rc_deref_mut().push(v),
      move |e| *c_err.rc_deref_mut() = Some(e),
    );

    source.clone().next(1);
    destroy.clone().error("destroyed");
    source.clone().next(2);

    assert_eq!(*values.rc_deref(), vec![1]);
    assert_eq!(*err.rc_deref(), Some("destroyed"));
    assert_eq!(source.subscriber_count(), 0);
  }

  #[test]
  fn silent_notifier_completion_keeps_mirroring() {
    let source = Subject::<i32, ()>::default();
    let destroy = Subject::<(), ()>::default();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    source
      .clone()
      .take_until(destroy.clone())
      .subscribe(move |v| c_values.rc_deref_mut().push(v));

    destroy.clone().complete();
    source.clone().next(1);
    assert_eq!(*values.rc_deref(), vec![1]);
  }

  #[test]
  fn cancels_interval_on_destroy() {
    let clock = FakeClock::default();
    let destroy = Subject::<(), Infallible>::default();
    let ticks = Rc::new(Cell::new(0));
    let c_ticks = ticks.clone();
    observable::interval(Duration::from_millis(10), clock.clone())
      .take_until(destroy.clone())
      .subscribe(move |_| c_ticks.set(c_ticks.get() + 1));

    clock.advance(Duration::from_millis(35));
    destroy.clone().next(());
    clock.advance(Duration::from_millis(100));
    assert_eq!(ticks.get(), 3);
    assert_eq!(clock.pending_tasks(), 0);
  }
}
