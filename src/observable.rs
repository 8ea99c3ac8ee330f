//! Observables and the sources that create them.
//!
//! An [`Observable`] is a lazy description of a push stream. Nothing happens
//! until it is subscribed; every subscription is an independent run of the
//! pipeline unless a multicasting operator (`share_replay`, `partition`) or a
//! [`Subject`](crate::subject::Subject) sits in between.

use crate::{
  observer::{FnObserver, Observer},
  ops::{
    buffer_when::BufferWhenOp,
    catch_error::CatchErrorOp,
    combine_latest::CombineLatestOp,
    debounce::DebounceOp,
    filter::{FilterOp, TryFilterOp},
    map::{MapErrOp, MapOp, TryMapOp},
    merge::MergeOp,
    partition::{partition, PartitionHalf},
    share_replay::{ShareReplayConfig, ShareReplayOp},
    start_with::StartWithOp,
    switch_map::SwitchMapOp,
    take::TakeOp,
    take_until::TakeUntilOp,
    tap::TapOp,
    to_array::CollectOp,
  },
  scheduler::Scheduler,
  subscription::{Subscription, SubscriptionHandle},
};
use std::time::Duration;

pub mod boxed;
pub use boxed::*;
pub mod create;
pub use create::*;
pub mod from_future;
pub use from_future::*;
pub mod from_stream;
pub use from_stream::*;
pub mod interval;
pub use interval::*;
pub mod of;
pub use of::*;

pub use crate::ops::{combine_latest::combine_latest, merge::merge};

/// A representation of any set of values over any amount of time.
///
/// Implementors only provide `actual_subscribe`; the operators and the
/// terminal `subscribe*` calls live on [`ObservableExt`].
pub trait Observable: Sized {
  type Item;
  type Err;
  type Unsub: Subscription + 'static;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static;
}

pub trait ObservableExt: Observable {
  /// Subscribe with a value callback only.
  ///
  /// An error reaching this subscription has nobody to handle it and is
  /// logged at `warn`.
  fn subscribe<N>(self, next: N) -> SubscriptionHandle
  where
    N: FnMut(Self::Item) + 'static,
  {
    self.subscribe_all(
      next,
      |_| tracing::warn!("stream error reached a subscriber without handler"),
      || {},
    )
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> SubscriptionHandle
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
  {
    self.subscribe_all(next, error, || {})
  }

  fn subscribe_all<N, E, C>(
    self,
    next: N,
    error: E,
    complete: C,
  ) -> SubscriptionHandle
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    let unsub = self.actual_subscribe(FnObserver::new(next, error, complete));
    SubscriptionHandle::new(unsub)
  }

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    MapOp::new(self, f)
  }

  /// Like `map`, but a failing transform terminates the stream with the
  /// returned error and cancels the upstream.
  fn try_map<B, F>(self, f: F) -> TryMapOp<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err>,
  {
    TryMapOp::new(self, f)
  }

  fn map_err<E, F>(self, f: F) -> MapErrOp<Self, F>
  where
    F: FnOnce(Self::Err) -> E,
  {
    MapErrOp::new(self, f)
  }

  /// Emit only the values for which `filter` returns `true`.
  fn filter<F>(self, filter: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    FilterOp::new(self, filter)
  }

  fn try_filter<F>(self, filter: F) -> TryFilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> Result<bool, Self::Err>,
  {
    TryFilterOp::new(self, filter)
  }

  /// Run a side effect for every value, passing the value through.
  fn tap<F>(self, f: F) -> TapOp<Self, F>
  where
    F: FnMut(&Self::Item),
  {
    TapOp::new(self, f)
  }

  /// Emit only the first `count` values, then complete.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp::new(self, count) }

  /// Mirror the source until `notifier` emits its first value, then
  /// complete and cancel both. A notifier error ends the stream with that
  /// error.
  fn take_until<N>(self, notifier: N) -> TakeUntilOp<Self, N>
  where
    N: Observable<Err = Self::Err>,
  {
    TakeUntilOp::new(self, notifier)
  }

  /// Emit `values` synchronously on subscribe, before anything from the
  /// source.
  fn start_with(self, values: Vec<Self::Item>) -> StartWithOp<Self> {
    StartWithOp::new(self, values)
  }

  /// Interleave the values of `self` and `other` in arrival order.
  ///
  /// Sources of different concrete types can be merged after `box_it`.
  fn merge(self, other: Self) -> MergeOp<Self> {
    MergeOp::new(vec![self, other])
  }

  /// Once both sides have emitted, emit the pair of latest values on every
  /// emission from either side.
  fn combine_latest<B>(self, other: B) -> CombineLatestOp<Self, B>
  where
    B: Observable<Err = Self::Err>,
  {
    CombineLatestOp::new(self, other)
  }

  /// Project each value to an inner observable and mirror only the most
  /// recent one; a new outer value cancels the previous inner subscription.
  fn switch_map<Inner, F>(self, f: F) -> SwitchMapOp<Self, F>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: Observable<Err = Self::Err>,
  {
    SwitchMapOp::new(self, f)
  }

  /// Flatten an observable of observables by always following the latest
  /// inner one.
  #[allow(clippy::type_complexity)]
  fn switch_all(self) -> SwitchMapOp<Self, fn(Self::Item) -> Self::Item>
  where
    Self::Item: Observable<Err = Self::Err>,
  {
    let identity: fn(Self::Item) -> Self::Item = std::convert::identity;
    SwitchMapOp::new(self, identity)
  }

  /// Emit a value only after `duration` has passed without another value.
  ///
  /// A pending value is flushed when the source completes.
  fn debounce<SD>(
    self,
    duration: Duration,
    scheduler: SD,
  ) -> DebounceOp<Self, SD>
  where
    SD: Scheduler,
  {
    DebounceOp::new(self, duration, scheduler)
  }

  /// Collect values into a buffer that is emitted each time `boundaries`
  /// emits.
  fn buffer_when<B>(self, boundaries: B) -> BufferWhenOp<Self, B>
  where
    B: Observable<Err = Self::Err>,
  {
    BufferWhenOp::new(self, boundaries)
  }

  /// Split the stream in two: values matching `predicate` go to the first
  /// half, the rest to the second. Both halves share one upstream
  /// subscription.
  #[allow(clippy::type_complexity)]
  fn partition<F>(
    self,
    predicate: F,
  ) -> (PartitionHalf<Self>, PartitionHalf<Self>)
  where
    Self: Clone + 'static,
    Self::Item: Clone + 'static,
    Self::Err: Clone + 'static,
    F: FnMut(&Self::Item, usize) -> bool + 'static,
  {
    partition(self, predicate)
  }

  /// Emit a single `Vec` of every value once the source completes.
  fn to_array(self) -> CollectOp<Self, Vec<Self::Item>> {
    CollectOp::new(self)
  }

  fn collect<C>(self) -> CollectOp<Self, C>
  where
    C: Default + Extend<Self::Item>,
  {
    CollectOp::new(self)
  }

  /// Multicast the source and replay the last `buffer_size` values to
  /// late subscribers.
  fn share_replay(self, config: ShareReplayConfig) -> ShareReplayOp<Self>
  where
    Self: Clone + 'static,
    Self::Item: Clone + 'static,
    Self::Err: Clone + 'static,
  {
    ShareReplayOp::new(self, config)
  }

  /// Multicast without replay; the upstream is dropped when the last
  /// subscriber leaves.
  fn share(self) -> ShareReplayOp<Self>
  where
    Self: Clone + 'static,
    Self::Item: Clone + 'static,
    Self::Err: Clone + 'static,
  {
    let config = ShareReplayConfig { buffer_size: 0, ref_count: true };
    ShareReplayOp::new(self, config)
  }

  /// On error, continue with the observable returned by `handler`.
  fn catch_error<F, R>(self, handler: F) -> CatchErrorOp<Self, F>
  where
    F: FnOnce(Self::Err) -> R,
    R: Observable<Item = Self::Item>,
  {
    CatchErrorOp::new(self, handler)
  }

  /// Erase the concrete type of this observable.
  fn box_it(self) -> BoxObservable<Self::Item, Self::Err>
  where
    Self: 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    BoxObservable::new(self)
  }
}

impl<T: Observable> ObservableExt for T {}
