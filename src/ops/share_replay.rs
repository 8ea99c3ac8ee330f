//! Multicasting with replay.
//!
//! [`ShareReplayOp`] connects to its source once and fans every notification
//! out to all of its subscribers. The last `buffer_size` values are kept and
//! replayed to each new subscriber before it receives live values.
//!
//! With `ref_count: false` (the default) the upstream, once made, is never
//! released by the operator: the source keeps running, and keeps filling the
//! replay buffer, even while nobody is subscribed. With `ref_count: true` the
//! upstream is released when the last subscriber leaves, and the next
//! subscriber starts a fresh run with an empty buffer.
//!
//! An upstream error is forwarded to the current subscribers and forgets the
//! run, so the next subscriber reconnects. After completion the buffer stays
//! available: late subscribers get the buffered values followed by the
//! completion.

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  subject::{Subject, SubjectSubscription},
  subscription::{BoxSubscription, Subscription},
};
use std::collections::VecDeque;

/// How [`share_replay`](crate::observable::ObservableExt::share_replay)
/// multicasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareReplayConfig {
  /// Number of most recent values replayed to a new subscriber.
  pub buffer_size: usize,
  /// Release the upstream when the subscriber count drops to zero.
  pub ref_count: bool,
}

impl Default for ShareReplayConfig {
  fn default() -> Self {
    ShareReplayConfig { buffer_size: 1, ref_count: false }
  }
}

impl ShareReplayConfig {
  pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
    self.buffer_size = buffer_size;
    self
  }

  pub fn with_ref_count(mut self, ref_count: bool) -> Self {
    self.ref_count = ref_count;
    self
  }
}

pub struct ShareReplayOp<S: Observable>(MutRc<ShareState<S>>);

struct ShareState<S: Observable> {
  source: S,
  config: ShareReplayConfig,
  connection: Option<Connection<S::Item, S::Err>>,
  generation: usize,
}

struct Connection<Item, Err> {
  subject: Subject<Item, Err>,
  buffer: VecDeque<Item>,
  upstream: Option<BoxSubscription>,
  subscribers: usize,
  completed: bool,
}

impl<S: Observable> Clone for ShareReplayOp<S> {
  fn clone(&self) -> Self { ShareReplayOp(self.0.clone()) }
}

impl<S: Observable> ShareReplayOp<S> {
  pub(crate) fn new(source: S, config: ShareReplayConfig) -> Self {
    ShareReplayOp(MutRc::own(ShareState {
      source,
      config,
      connection: None,
      generation: 0,
    }))
  }

  /// Subscribers currently registered on the running connection.
  pub fn subscriber_count(&self) -> usize {
    let state = self.0.rc_deref();
    state.connection.as_ref().map_or(0, |c| c.subscribers)
  }
}

impl<S> Observable for ShareReplayOp<S>
where
  S: Observable + Clone + 'static,
  S::Item: Clone + 'static,
  S::Err: Clone + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = ShareSubscription<S>;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let (replay, subject, generation, connect) = {
      let mut state = self.0.rc_deref_mut();
      let generation = state.generation;
      let connect = match state.connection {
        Some(_) => None,
        None => Some(state.source.clone()),
      };
      let connection = state.connection.get_or_insert_with(|| Connection {
        subject: Subject::default(),
        buffer: VecDeque::new(),
        upstream: None,
        subscribers: 0,
        completed: false,
      });
      connection.subscribers += 1;
      let replay: Vec<_> = connection.buffer.iter().cloned().collect();
      (replay, connection.subject.clone(), generation, connect)
    };

    for value in replay {
      if observer.is_finished() {
        break;
      }
      observer.next(value);
    }
    let inner = subject.actual_subscribe(observer);

    if let Some(source) = connect {
      tracing::trace!(generation, "share_replay connecting upstream");
      let unsub = source.actual_subscribe(ReplayRecorder {
        state: self.0.clone(),
        generation,
      });
      let mut state = self.0.rc_deref_mut();
      let current = state.generation == generation;
      match state.connection.as_mut() {
        Some(connection) if current => {
          connection.upstream = Some(unsub.into_boxed())
        }
        _ => {
          drop(state);
          unsub.unsubscribe();
        }
      }
    }

    ShareSubscription { inner, state: self.0, generation }
  }
}

/// Records upstream values into the replay buffer and multicasts them.
///
/// The recorder owns the shared state, so a connection stays alive while the
/// upstream holds it, even after every handle and every clone of the
/// operator has been dropped. The cycle ends when the upstream drops the
/// recorder: on disconnect, error or completion.
pub struct ReplayRecorder<S: Observable> {
  state: MutRc<ShareState<S>>,
  generation: usize,
}

impl<S: Observable> ReplayRecorder<S> {
  fn current(&self) -> Option<&MutRc<ShareState<S>>> {
    let current = {
      let s = self.state.rc_deref();
      s.generation == self.generation && s.connection.is_some()
    };
    current.then_some(&self.state)
  }
}

impl<S> Observer<S::Item, S::Err> for ReplayRecorder<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  fn next(&mut self, value: S::Item) {
    let Some(state) = self.current() else { return };
    let mut subject = {
      let mut state = state.rc_deref_mut();
      let buffer_size = state.config.buffer_size;
      let Some(connection) = state.connection.as_mut() else { return };
      if buffer_size > 0 {
        connection.buffer.push_back(value.clone());
        while connection.buffer.len() > buffer_size {
          connection.buffer.pop_front();
        }
      }
      connection.subject.clone()
    };
    subject.next(value);
  }

  fn error(self, err: S::Err) {
    let Some(state) = self.current() else { return };
    let connection = {
      let mut state = state.rc_deref_mut();
      state.generation += 1;
      state.connection.take()
    };
    if let Some(connection) = connection {
      tracing::trace!(
        generation = self.generation,
        "share_replay upstream failed"
      );
      connection.subject.error(err);
      connection.upstream.unsubscribe();
    }
  }

  fn complete(self) {
    let Some(state) = self.current() else { return };
    let subject = {
      let mut state = state.rc_deref_mut();
      let Some(connection) = state.connection.as_mut() else { return };
      connection.completed = true;
      connection.subject.clone()
    };
    subject.complete();
  }

  fn is_finished(&self) -> bool { self.current().is_none() }
}

pub struct ShareSubscription<S: Observable> {
  inner: SubjectSubscription<S::Item, S::Err>,
  state: MutRc<ShareState<S>>,
  generation: usize,
}

impl<S: Observable> Subscription for ShareSubscription<S> {
  fn unsubscribe(self) {
    self.inner.unsubscribe();
    let upstream = {
      let mut state = self.state.rc_deref_mut();
      if state.generation != self.generation {
        return;
      }
      let ref_count = state.config.ref_count;
      let Some(connection) = state.connection.as_mut() else { return };
      connection.subscribers = connection.subscribers.saturating_sub(1);
      if ref_count && connection.subscribers == 0 && !connection.completed {
        tracing::trace!(
          generation = self.generation,
          "share_replay disconnecting upstream"
        );
        state.generation += 1;
        state.connection.take().and_then(|c| c.upstream)
      } else {
        None
      }
    };
    upstream.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.inner.is_closed() }
}
