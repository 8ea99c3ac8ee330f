//! Partition operator
//!
//! Splits one source into two observables. The `n`-th source value (counting
//! from 0) goes to the first half when `predicate(&value, n)` returns `true`,
//! to the second half otherwise.
//!
//! Both halves share a single upstream subscription. It is made when the
//! first half gets its first subscriber and released when neither half has a
//! subscriber left; a later subscriber then starts a fresh run of the source.
//! Values routed to a half that has never been subscribed are kept and handed
//! to its first subscriber, so a source that emits synchronously on subscribe
//! still reaches the half subscribed second.

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  subject::{Subject, SubjectSubscription},
  subscription::{BoxSubscription, Subscription},
};
use std::{cell::RefCell, rc::Rc};

type Predicate<Item> = Rc<RefCell<Box<dyn FnMut(&Item, usize) -> bool>>>;

/// Split `source` by `predicate`, see the [module docs](self).
#[allow(clippy::type_complexity)]
pub fn partition<S, F>(
  source: S,
  predicate: F,
) -> (PartitionHalf<S>, PartitionHalf<S>)
where
  S: Observable + Clone + 'static,
  S::Item: Clone + 'static,
  S::Err: Clone + 'static,
  F: FnMut(&S::Item, usize) -> bool + 'static,
{
  let predicate: Box<dyn FnMut(&S::Item, usize) -> bool> = Box::new(predicate);
  let state = MutRc::own(PartitionState {
    source,
    predicate: Rc::new(RefCell::new(predicate)),
    halves: [Half::default(), Half::default()],
    upstream: None,
    connected: false,
    generation: 0,
    index: 0,
    terminated: false,
  });
  (
    PartitionHalf { state: state.clone(), side: 0 },
    PartitionHalf { state, side: 1 },
  )
}

struct PartitionState<S: Observable> {
  source: S,
  predicate: Predicate<S::Item>,
  halves: [Half<S::Item, S::Err>; 2],
  upstream: Option<BoxSubscription>,
  connected: bool,
  generation: usize,
  index: usize,
  terminated: bool,
}

struct Half<Item, Err> {
  subject: Subject<Item, Err>,
  backlog: Vec<Item>,
  ever_subscribed: bool,
  live: usize,
}

impl<Item, Err> Default for Half<Item, Err> {
  fn default() -> Self {
    Half {
      subject: Subject::default(),
      backlog: vec![],
      ever_subscribed: false,
      live: 0,
    }
  }
}

impl<S: Observable> PartitionState<S> {
  /// Forget the current run; returns the upstream to release.
  fn reset(&mut self) -> Option<BoxSubscription> {
    self.generation += 1;
    self.connected = false;
    self.index = 0;
    self.halves = [Half::default(), Half::default()];
    self.upstream.take()
  }
}

/// One side of a [`partition`].
pub struct PartitionHalf<S: Observable> {
  state: MutRc<PartitionState<S>>,
  side: usize,
}

impl<S: Observable> Clone for PartitionHalf<S> {
  fn clone(&self) -> Self {
    PartitionHalf { state: self.state.clone(), side: self.side }
  }
}

impl<S> Observable for PartitionHalf<S>
where
  S: Observable + Clone + 'static,
  S::Item: Clone + 'static,
  S::Err: Clone + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = PartitionSubscription<S>;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let (backlog, subject, connect) = {
      let mut state = self.state.rc_deref_mut();
      let half = &mut state.halves[self.side];
      half.live += 1;
      let backlog = if half.ever_subscribed {
        vec![]
      } else {
        half.ever_subscribed = true;
        std::mem::take(&mut half.backlog)
      };
      let subject = half.subject.clone();
      let connect = if state.connected {
        None
      } else {
        state.connected = true;
        Some((state.source.clone(), state.generation))
      };
      (backlog, subject, connect)
    };

    for value in backlog {
      if observer.is_finished() {
        break;
      }
      observer.next(value);
    }
    let inner = subject.actual_subscribe(observer);

    if let Some((source, generation)) = connect {
      tracing::trace!(generation, "partition connecting upstream");
      let unsub = source.actual_subscribe(PartitionRouter {
        state: self.state.clone(),
        generation,
      });
      let mut state = self.state.rc_deref_mut();
      if state.generation == generation {
        state.upstream = Some(unsub.into_boxed());
      } else {
        drop(state);
        unsub.unsubscribe();
      }
    }

    PartitionSubscription { inner, state: self.state, side: self.side }
  }
}

/// Feeds the upstream values into the two halves.
///
/// Holds the shared state strongly: the halves keep receiving values after
/// their handles are dropped, until the run terminates or is reset.
pub struct PartitionRouter<S: Observable> {
  state: MutRc<PartitionState<S>>,
  generation: usize,
}

impl<S> PartitionRouter<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  /// The shared state, if this router still feeds the current run.
  fn current(&self) -> Option<&MutRc<PartitionState<S>>> {
    let current = self.state.rc_deref().generation == self.generation;
    current.then_some(&self.state)
  }

  fn subjects(&self, terminate: bool) -> Vec<Subject<S::Item, S::Err>> {
    let Some(state) = self.current() else { return vec![] };
    let mut state = state.rc_deref_mut();
    if state.terminated {
      return vec![];
    }
    state.terminated = terminate;
    state.halves.iter().map(|h| h.subject.clone()).collect()
  }
}

impl<S> Observer<S::Item, S::Err> for PartitionRouter<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  fn next(&mut self, value: S::Item) {
    let Some(state) = self.current() else { return };
    let (predicate, index) = {
      let mut state = state.rc_deref_mut();
      let index = state.index;
      state.index += 1;
      (state.predicate.clone(), index)
    };
    let matches = {
      let mut predicate = predicate.borrow_mut();
      (*predicate)(&value, index)
    };
    let side = if matches { 0 } else { 1 };

    let subject = {
      let mut state = state.rc_deref_mut();
      let half = &mut state.halves[side];
      if half.ever_subscribed {
        Some(half.subject.clone())
      } else {
        half.backlog.push(value.clone());
        None
      }
    };
    if let Some(mut subject) = subject {
      subject.next(value);
    }
  }

  fn error(self, err: S::Err) {
    for subject in self.subjects(true) {
      subject.error(err.clone());
    }
  }

  fn complete(self) {
    for subject in self.subjects(true) {
      subject.complete();
    }
  }

  fn is_finished(&self) -> bool { self.current().is_none() }
}

pub struct PartitionSubscription<S: Observable> {
  inner: SubjectSubscription<S::Item, S::Err>,
  state: MutRc<PartitionState<S>>,
  side: usize,
}

impl<S: Observable> Subscription for PartitionSubscription<S> {
  fn unsubscribe(self) {
    self.inner.unsubscribe();
    let upstream = {
      let mut state = self.state.rc_deref_mut();
      let half = &mut state.halves[self.side];
      half.live = half.live.saturating_sub(1);
      let idle = state.halves.iter().all(|h| h.live == 0);
      if idle && state.connected && !state.terminated {
        tracing::trace!(generation = state.generation, "partition reset");
        state.reset()
      } else {
        None
      }
    };
    upstream.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.inner.is_closed() }
}
