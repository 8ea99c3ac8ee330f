//! Collect operator
//!
//! Accumulates every value of the source and emits the whole collection once
//! the source completes. Nothing is emitted if the source errors or is
//! cancelled first, so a consumer never observes a partial collection.

use crate::{observable::Observable, observer::Observer};
use std::marker::PhantomData;

/// Emits one collection of every source value on completion.
///
/// # Examples
///
/// ```
/// use rxflow::prelude::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let result = Rc::new(RefCell::new(None));
/// let c_result = result.clone();
/// observable::from_iter([1, 2, 3])
///   .to_array()
///   .subscribe(move |v| *c_result.borrow_mut() = Some(v));
/// assert_eq!(*result.borrow(), Some(vec![1, 2, 3]));
/// ```
pub struct CollectOp<S, C> {
  source: S,
  _collection: PhantomData<C>,
}

impl<S, C> CollectOp<S, C> {
  pub(crate) fn new(source: S) -> Self {
    CollectOp { source, _collection: PhantomData }
  }
}

impl<S: Clone, C> Clone for CollectOp<S, C> {
  fn clone(&self) -> Self { CollectOp::new(self.source.clone()) }
}

impl<S, C> Observable for CollectOp<S, C>
where
  S: Observable,
  C: Default + Extend<S::Item> + 'static,
{
  type Item = C;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<C, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(CollectObserver { observer, collection: C::default() })
  }
}

pub struct CollectObserver<O, C> {
  observer: O,
  collection: C,
}

impl<O, C, Item, Err> Observer<Item, Err> for CollectObserver<O, C>
where
  O: Observer<C, Err>,
  C: Extend<Item>,
{
  fn next(&mut self, value: Item) { self.collection.extend(Some(value)); }

  fn error(self, err: Err) { self.observer.error(err); }

  fn complete(mut self) {
    self.observer.next(self.collection);
    self.observer.complete();
  }

  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, rc::MutRc};
  use std::collections::HashSet;

  #[test]
  fn emits_once_on_complete() {
    let subject = Subject::<i32, ()>::default();
    let result = MutRc::own(vec![]);
    let c_result = result.clone();
    subject
      .clone()
      .to_array()
      .subscribe(move |v| c_result.rc_deref_mut().push(v));

    subject.clone().next(1);
    subject.clone().next(2);
    assert!(result.rc_deref().is_empty());
    subject.clone().complete();
    assert_eq!(*result.rc_deref(), vec![vec![1, 2]]);
  }

  #[test]
  fn nothing_on_error() {
    let subject = Subject::<i32, &'static str>::default();
    let result = MutRc::own(vec![]);
    let err = MutRc::own(None);
    let c_result = result.clone();
    let c_err = err.clone();
    subject.clone().to_array().subscribe_err(
      move |v| c_result.rc_deref_mut().push(v),
      move |e| *c_err.rc_deref_mut() = Some(e),
    );

    subject.clone().next(1);
    subject.clone().error("lost");
    assert!(result.rc_deref().is_empty());
    assert_eq!(*err.rc_deref(), Some("lost"));
  }

  #[test]
  fn empty_source_gives_empty_vec() {
    let result = MutRc::own(None);
    let c_result = result.clone();
    observable::empty::<i32>()
      .to_array()
      .subscribe(move |v| *c_result.rc_deref_mut() = Some(v));
    assert_eq!(*result.rc_deref(), Some(vec![]));
  }

  #[test]
  fn collect_into_set() {
    let result = MutRc::own(HashSet::new());
    let c_result = result.clone();
    observable::from_iter([1, 2, 2, 3])
      .collect::<HashSet<_>>()
      .subscribe(move |v| *c_result.rc_deref_mut() = v);
    assert_eq!(*result.rc_deref(), HashSet::from([1, 2, 3]));
  }
}
