use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
};
use std::{
  convert::Infallible,
  time::{Duration, Instant},
};

/// Creates an observable which will emit a sequential number (starting at
/// 0) every `period` on `scheduler`.
///
/// The first value arrives after one full period. The timer is released as
/// soon as the subscription is cancelled or the downstream stops accepting
/// values.
pub fn interval<SD: Scheduler>(
  period: Duration,
  scheduler: SD,
) -> IntervalObservable<SD> {
  IntervalObservable { period, scheduler }
}

#[derive(Clone)]
pub struct IntervalObservable<SD> {
  period: Duration,
  scheduler: SD,
}

impl<SD: Scheduler> Observable for IntervalObservable<SD> {
  type Item = usize;
  type Err = Infallible;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<usize, Infallible> + 'static,
  {
    self.scheduler.schedule_repeating(
      move |seq| {
        observer.next(seq);
        !observer.is_finished()
      },
      self.period,
    )
  }
}

/// Creates an observable that emits the scheduler's current instant once
/// after `delay`, then completes.
pub fn timer<SD: Scheduler>(
  delay: Duration,
  scheduler: SD,
) -> TimerObservable<SD> {
  TimerObservable { delay, scheduler }
}

#[derive(Clone)]
pub struct TimerObservable<SD> {
  delay: Duration,
  scheduler: SD,
}

impl<SD: Scheduler> Observable for TimerObservable<SD> {
  type Item = Instant;
  type Err = Infallible;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Instant, Infallible> + 'static,
  {
    let scheduler = self.scheduler.clone();
    self.scheduler.schedule(
      move || {
        observer.next(scheduler.now());
        observer.complete();
      },
      self.delay,
    )
  }
}
