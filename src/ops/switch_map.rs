//! SwitchMap operator
//!
//! Projects each value of the source to an inner observable and mirrors only
//! the most recent one. When a new inner observable is produced the previous
//! inner subscription is cancelled before the new one is subscribed, so a
//! superseded inner can never reach the downstream.
//!
//! - The result completes once the source completed and the current inner
//!   completed.
//! - Errors from the source or the current inner are propagated immediately
//!   and cancel everything.
//!
//! Typical use: ignore the result of an in-flight lookup once a newer request
//! has been made.

use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  rc::MutRc,
  subscription::{
    MultiSubscription, SerialSubscription, Subscription, ZipSubscription,
  },
};

#[derive(Clone)]
pub struct SwitchMapOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> SwitchMapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { SwitchMapOp { source, func } }
}

#[derive(Default)]
struct SwitchState {
  generation: usize,
  outer_done: bool,
  inner_active: bool,
}

impl<S, F, Inner> Observable for SwitchMapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Inner + 'static,
  Inner: Observable<Err = S::Err>,
  Inner::Item: 'static,
  S::Err: 'static,
{
  type Item = Inner::Item;
  type Err = S::Err;
  type Unsub = ZipSubscription<MultiSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Inner::Item, S::Err> + 'static,
  {
    let shared = SharedObserver::new(observer);
    let outer = MultiSubscription::new();
    let inner = SerialSubscription::new();
    outer.append(shared.clone());

    let unsub = self.source.actual_subscribe(SwitchMapObserver {
      core: SwitchCore {
        shared,
        state: MutRc::own(SwitchState::default()),
        outer: outer.clone(),
        inner: inner.clone(),
      },
      func: self.func,
    });
    outer.append(unsub);
    ZipSubscription::new(outer, inner)
  }
}

pub struct SwitchCore<O, Item, Err> {
  shared: SharedObserver<O, Item, Err>,
  state: MutRc<SwitchState>,
  outer: MultiSubscription,
  inner: SerialSubscription,
}

impl<O, Item, Err> Clone for SwitchCore<O, Item, Err> {
  fn clone(&self) -> Self {
    SwitchCore {
      shared: self.shared.clone(),
      state: self.state.clone(),
      outer: self.outer.clone(),
      inner: self.inner.clone(),
    }
  }
}

impl<O, Item, Err> SwitchCore<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn is_current(&self, generation: usize) -> bool {
    self.state.rc_deref().generation == generation
  }

  fn fail(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.teardown();
  }

  fn finish(self) {
    self.shared.emit(Notification::Complete);
    self.teardown();
  }

  fn teardown(self) {
    self.inner.unsubscribe();
    self.outer.unsubscribe();
  }
}

pub struct SwitchMapObserver<O, F, Item, Err> {
  core: SwitchCore<O, Item, Err>,
  func: F,
}

impl<O, F, SItem, Inner, Item, Err> Observer<SItem, Err>
  for SwitchMapObserver<O, F, Item, Err>
where
  O: Observer<Item, Err> + 'static,
  F: FnMut(SItem) -> Inner,
  Inner: Observable<Item = Item, Err = Err>,
  Item: 'static,
  Err: 'static,
{
  fn next(&mut self, value: SItem) {
    self.core.inner.cancel_current();
    let generation = {
      let mut state = self.core.state.rc_deref_mut();
      state.generation += 1;
      state.inner_active = true;
      state.generation
    };

    let unsub = (self.func)(value).actual_subscribe(InnerObserver {
      core: self.core.clone(),
      generation,
    });
    if self.core.is_current(generation) {
      self.core.inner.replace(unsub);
    } else {
      unsub.unsubscribe();
    }
  }

  fn error(self, err: Err) { self.core.fail(err) }

  fn complete(self) {
    let idle = {
      let mut state = self.core.state.rc_deref_mut();
      state.outer_done = true;
      !state.inner_active
    };
    if idle {
      self.core.finish();
    }
  }

  fn is_finished(&self) -> bool { self.core.shared.is_finished() }
}

pub struct InnerObserver<O, Item, Err> {
  core: SwitchCore<O, Item, Err>,
  generation: usize,
}

impl<O, Item, Err> Observer<Item, Err> for InnerObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.core.is_current(self.generation) {
      self.core.shared.emit(Notification::Next(value));
    }
  }

  fn error(self, err: Err) {
    if self.core.is_current(self.generation) {
      self.core.fail(err);
    }
  }

  fn complete(self) {
    if !self.core.is_current(self.generation) {
      return;
    }
    let outer_done = {
      let mut state = self.core.state.rc_deref_mut();
      state.inner_active = false;
      state.outer_done
    };
    if outer_done {
      self.core.finish();
    }
  }

  fn is_finished(&self) -> bool {
    !self.core.is_current(self.generation) || self.core.shared.is_finished()
  }
}
