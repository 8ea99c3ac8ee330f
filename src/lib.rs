//! # rxflow: push-based reactive streams
//!
//! Observables describe how values are produced; nothing runs until a
//! subscription is made. Operators build new observables from existing ones,
//! time is injected through a [`Scheduler`](scheduler::Scheduler), and every
//! subscription can be cancelled through the handle it returns.
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! Everything lives on one thread: shared state is reference counted and the
//! types are `!Send`. Deliveries are synchronous and happen on the stack of
//! whatever pushed the value (a subject, a timer, a polled future).
//!
//! ## Feature Flags
//!
//! - **`timer`** (default): [`LocalPoolScheduler`] on top of
//!   `futures-time`
//! - **`tokio-scheduler`**: [`TokioLocalScheduler`] for use inside a tokio
//!   `LocalSet`
//!
//! [`LocalPoolScheduler`]: scheduler::LocalPoolScheduler
//! [`TokioLocalScheduler`]: scheduler::TokioLocalScheduler

pub mod error;
pub mod idle;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use error::{Error, Result};
