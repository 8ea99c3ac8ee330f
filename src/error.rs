use thiserror::Error;

/// Failures surfaced by the scheduling layer.
///
/// Stream errors travel through the `Err` type parameter of an observable and
/// never show up here; this type only covers the machinery that runs timers
/// and futures.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to spawn a task onto the local executor: {0}")]
  Spawn(#[from] futures::task::SpawnError),
  #[cfg(feature = "tokio-scheduler")]
  #[error("no tokio runtime on this thread: {0}")]
  NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
