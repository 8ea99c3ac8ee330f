use super::{Scheduler, TaskHandle};
use crate::error::Result;
use std::{
  future::Future,
  time::{Duration, Instant},
};
use tokio::runtime::Handle;

/// Runs tasks with `tokio::task::spawn_local`.
///
/// Time comes from `tokio::time`, so a paused test runtime drives timers
/// deterministically.
///
/// # Panics
///
/// `schedule` and `spawn` must run inside a `tokio::task::LocalSet`. Without
/// any runtime they fail softly (`Error::NoRuntime`, or a closed handle for
/// `schedule`), but on a runtime thread outside a `LocalSet` tokio panics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioLocalScheduler;

impl Scheduler for TokioLocalScheduler {
  fn now(&self) -> Instant { tokio::time::Instant::now().into_std() }

  fn schedule(
    &self,
    task: impl FnOnce() + 'static,
    delay: Duration,
  ) -> TaskHandle {
    if let Err(err) = Handle::try_current() {
      tracing::error!(%err, "cannot schedule a delayed task");
      return TaskHandle::closed();
    }
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let join = tokio::task::spawn_local(async move {
      tokio::time::sleep(delay).await;
      c_handle.finish();
      task();
    });
    handle.on_cancel(move || join.abort());
    handle
  }

  fn spawn(
    &self,
    future: impl Future<Output = ()> + 'static,
  ) -> Result<TaskHandle> {
    Handle::try_current()?;
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let join = tokio::task::spawn_local(async move {
      future.await;
      c_handle.finish();
    });
    handle.on_cancel(move || join.abort());
    Ok(handle)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{rc::MutRc, subscription::Subscription};

  #[tokio::test(flavor = "current_thread", start_paused = true)]
  async fn sleeps_on_tokio_time() {
    let local = tokio::task::LocalSet::new();
    local
      .run_until(async {
        let log = MutRc::own(vec![]);
        let c_log = log.clone();
        let cancelled = log.clone();
        TokioLocalScheduler.schedule(
          move || c_log.rc_deref_mut().push("fired"),
          Duration::from_millis(10),
        );
        let handle = TokioLocalScheduler.schedule(
          move || cancelled.rc_deref_mut().push("cancelled"),
          Duration::from_millis(10),
        );
        handle.unsubscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*log.rc_deref(), vec!["fired"]);
      })
      .await;
  }

  #[tokio::test(flavor = "current_thread")]
  #[should_panic(expected = "LocalSet")]
  async fn spawn_outside_local_set_panics() {
    let _ = TokioLocalScheduler.spawn(async {});
  }

  #[test]
  fn spawn_without_runtime_fails() {
    let err = TokioLocalScheduler.spawn(async {}).err();
    assert!(matches!(err, Some(crate::Error::NoRuntime(_))));
  }
}
