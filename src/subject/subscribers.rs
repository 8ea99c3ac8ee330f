use super::SubjectState;
use crate::{
  observer::{BoxObserver, Observer},
  rc::WeakRc,
  subscription::Subscription,
};
use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

/// One registered observer.
///
/// `closed` is flipped first on unsubscribe so that a delivery already in
/// flight skips the entry even while its observer is still borrowed.
pub(super) struct Entry<Item, Err> {
  id: usize,
  closed: Cell<bool>,
  observer: RefCell<Option<BoxObserver<Item, Err>>>,
}

impl<Item, Err> Entry<Item, Err> {
  /// Mark the entry closed and hand out its observer, unless it is busy
  /// receiving a value right now.
  pub(super) fn close(&self) -> Option<BoxObserver<Item, Err>> {
    self.closed.set(true);
    self.observer.try_borrow_mut().ok().and_then(|mut o| o.take())
  }

  fn is_live(&self) -> bool {
    !self.closed.get()
      && self
        .observer
        .try_borrow()
        .map_or(true, |o| o.as_ref().map_or(false, |o| !o.is_finished()))
  }

  fn next(&self, value: Item) {
    match self.observer.try_borrow_mut() {
      Ok(mut observer) => {
        if let Some(observer) = observer.as_mut() {
          observer.next(value);
        }
      }
      Err(_) => tracing::debug!(id = self.id, "observer busy, value skipped"),
    }
  }
}

/// The subject's observer list, kept in registration order.
pub(super) struct Subscribers<Item, Err> {
  entries: Vec<Rc<Entry<Item, Err>>>,
  next_id: usize,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Subscribers { entries: vec![], next_id: 0 } }
}

impl<Item, Err> Subscribers<Item, Err> {
  pub(super) fn add(
    &mut self,
    observer: BoxObserver<Item, Err>,
  ) -> Rc<Entry<Item, Err>> {
    let entry = Rc::new(Entry {
      id: self.next_id,
      closed: Cell::new(false),
      observer: RefCell::new(Some(observer)),
    });
    self.next_id += 1;
    self.entries.push(entry.clone());
    entry
  }

  fn remove(&mut self, id: usize) -> Option<Rc<Entry<Item, Err>>> {
    let position = self.entries.iter().position(|e| e.id == id)?;
    Some(self.entries.remove(position))
  }

  pub(super) fn live_count(&self) -> usize {
    self.entries.iter().filter(|e| !e.closed.get()).count()
  }

  pub(super) fn snapshot(&self) -> Vec<Rc<Entry<Item, Err>>> {
    self.entries.iter().filter(|e| !e.closed.get()).cloned().collect()
  }

  pub(super) fn take_all(&mut self) -> Vec<Rc<Entry<Item, Err>>> {
    std::mem::take(&mut self.entries)
  }

  /// Drop entries that were unsubscribed or whose observer finished, handing
  /// back their observers so the caller can release them outside any borrow.
  pub(super) fn prune(&mut self) -> Vec<BoxObserver<Item, Err>> {
    let (live, gone): (Vec<_>, Vec<_>) =
      std::mem::take(&mut self.entries).into_iter().partition(|e| e.is_live());
    self.entries = live;
    gone.into_iter().filter_map(|e| e.close()).collect()
  }

  /// Deliver `value` to every entry of `snapshot` that is still open. The
  /// last one receives the value itself, the others a clone.
  pub(super) fn broadcast(snapshot: &[Rc<Entry<Item, Err>>], value: Item)
  where
    Item: Clone,
  {
    let mut iter = snapshot.iter().filter(|e| !e.closed.get()).peekable();
    while let Some(entry) = iter.next() {
      if iter.peek().is_some() {
        entry.next(value.clone());
      } else {
        entry.next(value);
        break;
      }
    }
  }
}

/// Subscription returned by [`Subject`](super::Subject).
///
/// Unsubscribing removes the observer from the subject right away; a value
/// being broadcast at that moment no longer reaches it.
pub struct SubjectSubscription<Item, Err> {
  entry: Option<Rc<Entry<Item, Err>>>,
  subject: WeakRc<SubjectState<Item, Err>>,
}

impl<Item, Err> SubjectSubscription<Item, Err> {
  pub(super) fn new(
    entry: Rc<Entry<Item, Err>>,
    subject: WeakRc<SubjectState<Item, Err>>,
  ) -> Self {
    SubjectSubscription { entry: Some(entry), subject }
  }

  /// For subscribers that arrived after the subject terminated.
  pub(super) fn closed() -> Self {
    SubjectSubscription { entry: None, subject: WeakRc::default() }
  }
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    let Some(entry) = self.entry else { return };
    let observer = entry.close();
    let removed = self.subject.upgrade().and_then(|subject| {
      let mut state = subject.try_rc_deref_mut().ok()?;
      state.subscribers.remove(entry.id)
    });
    drop(removed);
    drop(observer);
  }

  fn is_closed(&self) -> bool {
    self.entry.as_ref().map_or(true, |e| e.closed.get())
  }
}
