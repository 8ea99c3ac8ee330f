use crate::{
  error::Error,
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
};
use std::{cell::RefCell, convert::Infallible, future::Future, rc::Rc};

/// Converts a `Future` to an observable sequence. The observable emits the
/// future's output once it resolves, then completes.
///
/// The future is spawned on `scheduler` at subscribe time; unsubscribing
/// before it resolves aborts it. If the scheduler refuses the task the
/// observable completes without a value.
pub fn from_future<F, SD>(future: F, scheduler: SD) -> FutureObservable<F, SD>
where
  F: Future,
{
  FutureObservable { future, scheduler }
}

#[derive(Clone)]
pub struct FutureObservable<F, SD> {
  future: F,
  scheduler: SD,
}

impl<F, SD> Observable for FutureObservable<F, SD>
where
  F: Future + 'static,
  SD: Scheduler,
{
  type Item = F::Output;
  type Err = Infallible;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<F::Output, Infallible> + 'static,
  {
    let FutureObservable { future, scheduler } = self;
    let task = |mut observer: O| async move {
      let value = future.await;
      observer.next(value);
      observer.complete();
    };
    spawn_observed(&scheduler, observer, task, |o: O, _| o.complete())
  }
}

/// Like [`from_future`], for futures resolving to a `Result`: `Ok` is
/// emitted and followed by completion, `Err` becomes the stream error.
///
/// A task the scheduler refuses to run ends the stream with the converted
/// [`Error`].
pub fn from_future_result<F, SD>(
  future: F,
  scheduler: SD,
) -> FutureResultObservable<F, SD>
where
  F: Future,
{
  FutureResultObservable { future, scheduler }
}

#[derive(Clone)]
pub struct FutureResultObservable<F, SD> {
  future: F,
  scheduler: SD,
}

impl<F, SD, Item, Err> Observable for FutureResultObservable<F, SD>
where
  F: Future<Output = Result<Item, Err>> + 'static,
  SD: Scheduler,
  Err: From<Error>,
{
  type Item = Item;
  type Err = Err;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let FutureResultObservable { future, scheduler } = self;
    let task = |mut observer: O| async move {
      match future.await {
        Ok(value) => {
          observer.next(value);
          observer.complete();
        }
        Err(err) => observer.error(err),
      }
    };
    spawn_observed(&scheduler, observer, task, |o: O, err| o.error(err.into()))
  }
}

/// Spawn the task that drives `observer`.
///
/// The observer waits in a slot the task empties on its first poll, so when
/// the scheduler refuses the task it is still there to receive `on_refused`.
pub(crate) fn spawn_observed<SD, O, T, Fut>(
  scheduler: &SD,
  observer: O,
  task: T,
  on_refused: impl FnOnce(O, Error),
) -> TaskHandle
where
  SD: Scheduler,
  O: 'static,
  T: FnOnce(O) -> Fut + 'static,
  Fut: Future<Output = ()> + 'static,
{
  let slot = Rc::new(RefCell::new(Some(observer)));
  let c_slot = slot.clone();
  let spawned = scheduler.spawn(async move {
    let observer = c_slot.borrow_mut().take();
    if let Some(observer) = observer {
      task(observer).await;
    }
  });
  match spawned {
    Ok(handle) => handle,
    Err(err) => {
      tracing::error!(%err, "source could not start its task");
      let observer = slot.borrow_mut().take();
      if let Some(observer) = observer {
        on_refused(observer, err);
      }
      TaskHandle::closed()
    }
  }
}

#[cfg(test)]
mod test {
  use crate::{prelude::*, rc::MutRc};
  use futures::{channel::oneshot, future};

  #[derive(Debug, PartialEq)]
  enum Fetch {
    Lost,
    NotStarted,
  }

  impl From<crate::Error> for Fetch {
    fn from(_: crate::Error) -> Self { Fetch::NotStarted }
  }

  #[test]
  fn emits_resolved_value() {
    let clock = FakeClock::default();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    observable::from_future(future::ready(1), clock.clone())
      .subscribe(move |v| c_values.rc_deref_mut().push(v));
    assert!(values.rc_deref().is_empty());
    clock.run_until_stalled();
    assert_eq!(*values.rc_deref(), vec![1]);
  }

  #[test]
  fn result_error_becomes_stream_error() {
    let clock = FakeClock::default();
    let err = MutRc::own(None);
    let c_err = err.clone();
    observable::from_future_result(
      future::ready(Err::<i32, _>(Fetch::Lost)),
      clock.clone(),
    )
    .subscribe_err(|_| {}, move |e| *c_err.rc_deref_mut() = Some(e));
    clock.run_until_stalled();
    assert_eq!(*err.rc_deref(), Some(Fetch::Lost));
  }

  #[cfg(feature = "timer")]
  #[test]
  fn refused_spawn_reaches_the_observer() {
    use futures::executor::LocalPool;

    let scheduler = LocalPoolScheduler::new(LocalPool::new().spawner());
    let err = MutRc::own(None);
    let c_err = err.clone();
    observable::from_future_result(
      future::ready(Ok::<i32, Fetch>(1)),
      scheduler.clone(),
    )
    .subscribe_err(|_| {}, move |e| *c_err.rc_deref_mut() = Some(e));
    assert_eq!(*err.rc_deref(), Some(Fetch::NotStarted));

    let completed = MutRc::own(false);
    let c_completed = completed.clone();
    observable::from_future(future::ready(1), scheduler).subscribe_all(
      |_| {},
      |e| match e {},
      move || *c_completed.rc_deref_mut() = true,
    );
    assert!(*completed.rc_deref());
  }

  #[test]
  fn unsubscribe_aborts_pending_future() {
    let clock = FakeClock::default();
    let (tx, rx) = oneshot::channel::<i32>();
    let values = MutRc::own(vec![]);
    let c_values = values.clone();
    let subscription = observable::from_future(rx, clock.clone())
      .subscribe(move |v| c_values.rc_deref_mut().push(v));
    clock.run_until_stalled();
    subscription.unsubscribe();
    let _ = tx.send(5);
    clock.run_until_stalled();
    assert!(values.rc_deref().is_empty());
  }
}
