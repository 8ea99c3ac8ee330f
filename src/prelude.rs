//! Prelude module for convenient imports

pub use crate::idle::{idle_notifications, IdleConfig, IdleWindow};
pub use crate::observable;
pub use crate::observable::{BoxObservable, Emitter, Observable, ObservableExt};
pub use crate::observer::{FnObserver, Observer};
pub use crate::ops::share_replay::ShareReplayConfig;
#[cfg(feature = "timer")]
pub use crate::scheduler::LocalPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioLocalScheduler;
pub use crate::scheduler::{FakeClock, Scheduler, TaskHandle};
pub use crate::subject::Subject;
pub use crate::subscription::{
  BoxSubscription, Subscription, SubscriptionGuard, SubscriptionHandle,
};
