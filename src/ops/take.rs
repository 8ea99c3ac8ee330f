use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{MultiSubscription, Subscription},
};

/// Emits only the first `count` values emitted by the source observable,
/// then completes and cancels the source.
///
/// If the source emits fewer than `count` values all of them are emitted.
#[derive(Clone)]
pub struct TakeOp<S> {
  source: S,
  count: usize,
}

impl<S> TakeOp<S> {
  pub(crate) fn new(source: S, count: usize) -> Self {
    TakeOp { source, count }
  }
}

impl<S: Observable> Observable for TakeOp<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let upstream = MultiSubscription::new();
    let observer = if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      None
    } else {
      Some(observer)
    };
    let unsub = self.source.actual_subscribe(TakeObserver {
      observer,
      count: self.count,
      hits: 0,
      upstream: upstream.clone(),
    });
    upstream.append(unsub);
    upstream
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  count: usize,
  hits: usize,
  upstream: MultiSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else { return };
    self.hits += 1;
    observer.next(value);
    if self.hits >= self.count {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, rc::MutRc};
  use std::{cell::Cell, rc::Rc};

  #[test]
  fn base_function() {
    let completed = Rc::new(Cell::new(false));
    let next_count = Rc::new(Cell::new(0));
    let c_completed = completed.clone();
    let c_next_count = next_count.clone();

    observable::from_iter(0..100).take(5).subscribe_all(
      move |_| c_next_count.set(c_next_count.get() + 1),
      |e| match e {},
      move || c_completed.set(true),
    );

    assert!(completed.get());
    assert_eq!(next_count.get(), 5);
  }

  #[test]
  fn take_zero_completes_at_once() {
    let completed = Rc::new(Cell::new(false));
    let c_completed = completed.clone();
    observable::of(1)
      .take(0)
      .subscribe_all(|_| panic!("nothing expected"), |e| match e {}, move || {
        c_completed.set(true)
      });
    assert!(completed.get());
  }

  #[test]
  fn releases_subject_after_count() {
    let subject = Subject::<i32, ()>::default();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    subject
      .clone()
      .take(2)
      .subscribe(move |v| c_values.rc_deref_mut().push(v));

    let mut s = subject.clone();
    s.next(1);
    s.next(2);
    s.next(3);
    assert_eq!(*values.rc_deref(), vec![1, 2]);
    assert_eq!(subject.subscriber_count(), 0);
  }
}
