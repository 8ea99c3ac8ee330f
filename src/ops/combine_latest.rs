use crate::{
  observable::Observable,
  observer::{Notification, Observer, SharedObserver},
  rc::MutRc,
  subscription::{MultiSubscription, Subscription},
};

/// Combines the latest values of `sources` into one `Vec`.
///
/// Nothing is emitted until every source emitted at least once; after that
/// each value from any source emits the full vector of latest values, in the
/// order of `sources`. A source that completes without ever emitting
/// completes the result, since it could never emit. An empty `sources`
/// completes immediately.
pub fn combine_latest<S, I>(sources: I) -> CombineLatestAllOp<S>
where
  I: IntoIterator<Item = S>,
  S: Observable,
{
  CombineLatestAllOp { sources: sources.into_iter().collect() }
}

#[derive(Clone)]
pub struct CombineLatestOp<A, B> {
  a: A,
  b: B,
}

impl<A, B> CombineLatestOp<A, B> {
  pub(crate) fn new(a: A, b: B) -> Self { CombineLatestOp { a, b } }
}

impl<A, B> Observable for CombineLatestOp<A, B>
where
  A: Observable,
  B: Observable<Err = A::Err>,
  A::Item: Clone + 'static,
  B::Item: Clone + 'static,
  A::Err: 'static,
{
  type Item = (A::Item, B::Item);
  type Err = A::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let subscription = MultiSubscription::new();
    let core = CombineCore {
      shared: SharedObserver::new(observer),
      state: MutRc::own(PairState { a: None, b: None, completed: 0 }),
      subscription: subscription.clone(),
    };
    subscription.append(core.shared.clone());

    let unsub = self.a.actual_subscribe(AObserver(core.clone()));
    subscription.append(unsub);
    if !core.shared.is_closed() {
      let unsub = self.b.actual_subscribe(BObserver(core));
      subscription.append(unsub);
    }
    subscription
  }
}

enum CombineItem<A, B> {
  ItemA(A),
  ItemB(B),
}

struct PairState<A, B> {
  a: Option<A>,
  b: Option<B>,
  completed: usize,
}

pub struct CombineCore<O, A, B, Err> {
  shared: SharedObserver<O, (A, B), Err>,
  state: MutRc<PairState<A, B>>,
  subscription: MultiSubscription,
}

impl<O, A, B, Err> Clone for CombineCore<O, A, B, Err> {
  fn clone(&self) -> Self {
    CombineCore {
      shared: self.shared.clone(),
      state: self.state.clone(),
      subscription: self.subscription.clone(),
    }
  }
}

impl<O, A, B, Err> CombineCore<O, A, B, Err>
where
  O: Observer<(A, B), Err>,
  A: Clone,
  B: Clone,
{
  fn next(&self, value: CombineItem<A, B>) {
    let latest = {
      let mut state = self.state.rc_deref_mut();
      match value {
        CombineItem::ItemA(v) => state.a = Some(v),
        CombineItem::ItemB(v) => state.b = Some(v),
      }
      match (&state.a, &state.b) {
        (Some(a), Some(b)) => Some((a.clone(), b.clone())),
        _ => None,
      }
    };
    if let Some(pair) = latest {
      self.shared.emit(Notification::Next(pair));
    }
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self, emitted: bool) {
    let done = {
      let mut state = self.state.rc_deref_mut();
      state.completed += 1;
      !emitted || state.completed == 2
    };
    if done {
      self.shared.emit(Notification::Complete);
      self.subscription.unsubscribe();
    }
  }
}

pub struct AObserver<O, A, B, Err>(CombineCore<O, A, B, Err>);

impl<O, A, B, Err> Observer<A, Err> for AObserver<O, A, B, Err>
where
  O: Observer<(A, B), Err>,
  A: Clone,
  B: Clone,
{
  #[inline]
  fn next(&mut self, value: A) { self.0.next(CombineItem::ItemA(value)) }

  #[inline]
  fn error(self, err: Err) { self.0.error(err) }

  fn complete(self) {
    let emitted = self.0.state.rc_deref().a.is_some();
    self.0.complete(emitted)
  }

  #[inline]
  fn is_finished(&self) -> bool { self.0.shared.is_finished() }
}

pub struct BObserver<O, A, B, Err>(CombineCore<O, A, B, Err>);

impl<O, A, B, Err> Observer<B, Err> for BObserver<O, A, B, Err>
where
  O: Observer<(A, B), Err>,
  A: Clone,
  B: Clone,
{
  #[inline]
  fn next(&mut self, value: B) { self.0.next(CombineItem::ItemB(value)) }

  #[inline]
  fn error(self, err: Err) { self.0.error(err) }

  fn complete(self) {
    let emitted = self.0.state.rc_deref().b.is_some();
    self.0.complete(emitted)
  }

  #[inline]
  fn is_finished(&self) -> bool { self.0.shared.is_finished() }
}

#[derive(Clone)]
pub struct CombineLatestAllOp<S> {
  sources: Vec<S>,
}

impl<S> Observable for CombineLatestAllOp<S>
where
  S: Observable,
  S::Item: Clone + 'static,
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
    subscription.append(shared.clone());
    if self.sources.is_empty() {
      shared.emit(Notification::Complete);
      return subscription;
    }

    let state = MutRc::own(LatestState {
      latest: vec![None; self.sources.len()],
      completed: 0,
    });
    for (index, source) in self.sources.into_iter().enumerate() {
      if shared.is_closed() {
        break;
      }
      let unsub = source.actual_subscribe(IndexedObserver {
        index,
        shared: shared.clone(),
        state: state.clone(),
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

struct LatestState<Item> {
  latest: Vec<Option<Item>>,
  completed: usize,
}

pub struct IndexedObserver<O, Item, Err> {
  index: usize,
  shared: SharedObserver<O, Vec<Item>, Err>,
  state: MutRc<LatestState<Item>>,
  subscription: MultiSubscription,
}

impl<O, Item, Err> Observer<Item, Err> for IndexedObserver<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    let latest = {
      let mut state = self.state.rc_deref_mut();
      state.latest[self.index] = Some(value);
      state.latest.iter().cloned().collect::<Option<Vec<_>>>()
    };
    if let Some(values) = latest {
      self.shared.emit(Notification::Next(values));
    }
  }

  fn error(self, err: Err) {
    self.shared.emit(Notification::Error(err));
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let done = {
      let mut state = self.state.rc_deref_mut();
      state.completed += 1;
      let silent = state.latest[self.index].is_none();
      silent || state.completed == state.latest.len()
    };
    if done {
      self.shared.emit(Notification::Complete);
      self.subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.shared.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, rc::MutRc};
  use std::{cell::Cell, rc::Rc, time::Duration};

  #[test]
  fn combine_latest_base() {
    let clock = FakeClock::default();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();

    observable::interval(Duration::from_millis(2), clock.clone())
      .combine_latest(observable::interval(
        Duration::from_millis(3),
        clock.clone(),
      ))
      .take(7)
      .subscribe(move |v| c_values.rc_deref_mut().push(v));

    clock.advance(Duration::from_millis(10));
    // both tick at 6ms; the 3ms interval queued its tick first
    assert_eq!(
      *values.rc_deref(),
      vec![(0, 0), (1, 0), (1, 1), (2, 1), (3, 1), (3, 2), (4, 2)]
    );
    assert_eq!(clock.pending_tasks(), 0);
  }

  #[test]
  fn waits_for_every_input() {
    let a = Subject::<&'static str, ()>::default();
    let b = Subject::<i32, ()>::default();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    a.clone()
      .combine_latest(b.clone())
      .subscribe(move |v| c_values.rc_deref_mut().push(v));

    a.clone().next("x");
    a.clone().next("y");
    assert!(values.rc_deref().is_empty());
    b.clone().next(1);
    a.clone().next("z");
    assert_eq!(*values.rc_deref(), vec![("y", 1), ("z", 1)]);
  }

  #[test]
  fn complete() {
    let completed = Rc::new(Cell::new(false));
    let a = Subject::<i32, ()>::default();
    let b = Subject::<i32, ()>::default();
    let c_completed = completed.clone();
    a.clone().combine_latest(b.clone()).subscribe_all(
      |_| {},
      |_| {},
      move || c_completed.set(true),
    );
    a.clone().next(1);
    b.clone().next(2);
    a.clone().complete();
    assert!(!completed.get());
    b.clone().complete();
    assert!(completed.get());
  }

  #[test]
  fn silent_input_completes_the_result() {
    let completed = Rc::new(Cell::new(false));
    let a = Subject::<i32, ()>::default();
    let b = Subject::<i32, ()>::default();
    let c_completed = completed.clone();
    a.clone().combine_latest(b.clone()).subscribe_all(
      |_| {},
      |_| {},
      move || c_completed.set(true),
    );
    a.clone().next(1);
    b.clone().complete();
    assert!(completed.get());
    assert_eq!(a.subscriber_count(), 0);
  }

  #[test]
  fn error_cancels_the_other_input() {
    let a = Subject::<i32, &'static str>::default();
    let b = Subject::<i32, &'static str>::default();
    let err = MutRc::own(None);
    let c_err = err.clone();
    a.clone()
      .combine_latest(b.clone())
      .subscribe_err(|_| {}, move |e| *c_err.rc_deref_mut() = Some(e));
    b.clone().error("b failed");
    assert_eq!(*err.rc_deref(), Some("b failed"));
    assert_eq!(a.subscriber_count(), 0);
  }

  #[test]
  fn n_ary_yields_vectors() {
    let inputs: Vec<Subject<i32, ()>> =
      (0..3).map(|_| Subject::default()).collect();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    observable::combine_latest(inputs.clone())
      .subscribe(move |v| c_values.rc_deref_mut().push(v));

    inputs[0].clone().next(1);
    inputs[1].clone().next(2);
    assert!(values.rc_deref().is_empty());
    inputs[2].clone().next(3);
    inputs[1].clone().next(20);
    assert_eq!(*values.rc_deref(), vec![vec![1, 2, 3], vec![1, 20, 3]]);
  }

  #[test]
  fn n_ary_empty_completes() {
    let completed = Rc::new(Cell::new(false));
    let c_completed = completed.clone();
    observable::combine_latest(Vec::<Subject<i32, ()>>::new()).subscribe_all(
      |_| {},
      |_| {},
      move || c_completed.set(true),
    );
    assert!(completed.get());
  }
}
