use std::{
  cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut},
  rc::{Rc, Weak},
};

/// Shared, mutable ownership of a value inside the single-threaded scope.
///
/// Every piece of state that is reachable from more than one observer (a
/// combinator's shared downstream, a subject's subscriber list, a replay
/// buffer) lives in a `MutRc`.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

/// Non-owning counterpart of [`MutRc`].
pub struct WeakRc<T>(Weak<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  pub fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }

  #[inline]
  pub fn try_rc_deref(&self) -> Result<Ref<'_, T>, BorrowError> {
    self.0.try_borrow()
  }

  #[inline]
  pub fn try_rc_deref_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
    self.0.try_borrow_mut()
  }

  pub fn downgrade(&self) -> WeakRc<T> { WeakRc(Rc::downgrade(&self.0)) }

  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> WeakRc<T> {
  pub fn upgrade(&self) -> Option<MutRc<T>> { self.0.upgrade().map(MutRc) }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for WeakRc<T> {
  fn default() -> Self { Self(Weak::new()) }
}

impl<T> Clone for WeakRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}
