use super::{Scheduler, TaskHandle};
use crate::error::Result;
use futures::{
  executor::LocalSpawner,
  future::{abortable, FutureExt},
  task::LocalSpawnExt,
};
use std::{
  future::Future,
  time::{Duration, Instant},
};

/// Runs tasks on a `futures` `LocalPool` through its spawner, measuring time
/// with the wall clock.
#[derive(Clone)]
pub struct LocalPoolScheduler {
  spawner: LocalSpawner,
}

impl LocalPoolScheduler {
  pub fn new(spawner: LocalSpawner) -> Self { Self { spawner } }
}

impl Scheduler for LocalPoolScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule(
    &self,
    task: impl FnOnce() + 'static,
    delay: Duration,
  ) -> TaskHandle {
    let delayed = async move {
      futures_time::task::sleep(delay.into()).await;
    };
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let (delayed, abort) = abortable(delayed);
    let spawned = self.spawner.spawn_local(delayed.map(move |res| {
      if res.is_ok() {
        c_handle.finish();
        task();
      }
    }));
    match spawned {
      Ok(()) => handle.on_cancel(move || abort.abort()),
      Err(err) => {
        tracing::error!(%err, "failed to schedule a delayed task");
        handle.finish();
      }
    }
    handle
  }

  fn spawn(
    &self,
    future: impl Future<Output = ()> + 'static,
  ) -> Result<TaskHandle> {
    let (future, abort) = abortable(future);
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.spawner.spawn_local(async move {
      if future.await.is_ok() {
        c_handle.finish();
      }
    })?;
    handle.on_cancel(move || abort.abort());
    Ok(handle)
  }
}
