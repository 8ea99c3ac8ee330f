//! Inactivity detection.
//!
//! Merges any number of event sources and splits time into consecutive
//! windows of [`IdleConfig::window`]. Every window in which none of the
//! sources emitted produces one [`IdleWindow`] notification. Windows are
//! independent: a long quiet period yields one notification per window, and
//! a single event is enough to keep its window from being reported.
//!
//! ```
//! use rxflow::prelude::*;
//! use std::{cell::Cell, convert::Infallible, rc::Rc, time::Duration};
//!
//! let clock = FakeClock::default();
//! let clicks = Subject::<(), Infallible>::default();
//! let idle = Rc::new(Cell::new(0));
//! let c_idle = idle.clone();
//!
//! idle_notifications(
//!   [clicks.clone()],
//!   IdleConfig::new(Duration::from_secs(60)),
//!   clock.clone(),
//! )
//! .subscribe(move |_| c_idle.set(c_idle.get() + 1));
//!
//! clicks.clone().next(());
//! clock.advance(Duration::from_secs(60));
//! assert_eq!(idle.get(), 0);
//! clock.advance(Duration::from_secs(60));
//! assert_eq!(idle.get(), 1);
//! ```

use crate::{
  observable::{interval, merge, Observable, ObservableExt},
  observer::Observer,
  scheduler::Scheduler,
  subscription::MultiSubscription,
};
use std::{
  convert::Infallible,
  time::{Duration, Instant},
};

/// Settings of the idle detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleConfig {
  /// Length of one observation window.
  pub window: Duration,
}

impl IdleConfig {
  pub fn new(window: Duration) -> Self { IdleConfig { window } }
}

impl Default for IdleConfig {
  fn default() -> Self { IdleConfig { window: Duration::from_secs(60) } }
}

/// A window without any event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleWindow {
  /// Position of the window, counting from 0 at subscription.
  pub index: usize,
  pub start: Instant,
  pub end: Instant,
}

/// Emit an [`IdleWindow`] for every window in which none of `sources`
/// emitted.
///
/// The first window starts at subscription. Errors of any source terminate
/// the detector; it completes when all sources completed.
pub fn idle_notifications<S, I, SD>(
  sources: I,
  config: IdleConfig,
  scheduler: SD,
) -> IdleNotifications<S, SD>
where
  I: IntoIterator<Item = S>,
  S: Observable,
  SD: Scheduler,
{
  IdleNotifications {
    sources: sources.into_iter().collect(),
    config,
    scheduler,
  }
}

#[derive(Clone)]
pub struct IdleNotifications<S, SD> {
  sources: Vec<S>,
  config: IdleConfig,
  scheduler: SD,
}

fn never_fails<E>(never: Infallible) -> E { match never {} }

impl<S, SD> Observable for IdleNotifications<S, SD>
where
  S: Observable,
  S::Item: 'static,
  S::Err: 'static,
  SD: Scheduler,
{
  type Item = IdleWindow;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<IdleWindow, S::Err> + 'static,
  {
    let window = self.config.window;
    let clock = self.scheduler.clone();
    let boundaries =
      interval(window, self.scheduler).map_err(never_fails::<S::Err>);
    let mut index = 0;

    merge(self.sources)
      .buffer_when(boundaries)
      .map(move |batch| {
        let current = index;
        index += 1;
        (current, batch.is_empty())
      })
      .filter(|(_, idle)| *idle)
      .map(move |(index, _)| {
        let end = clock.now();
        tracing::debug!(index, "idle window");
        let start = end.checked_sub(window).unwrap_or(end);
        IdleWindow { index, start, end }
      })
      .actual_subscribe(observer)
  }
}
