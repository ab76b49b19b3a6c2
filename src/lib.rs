//! # tasktrigger
//!
//! **tasktrigger** runs async units of work in response to signals.
//!
//! A [`Task`] wraps a callback. It can run once immediately, or wait on a
//! trigger source and run every time the source fires. Completed executions
//! notify downstream tasks, so tasks chain into pipelines. A [`Runner`]
//! keeps tasks under unique names and offers bulk run, cancel and shutdown.
//!
//! ## Architecture
//! ```text
//!   timer / channel / stream / future
//!                 │  SignalSource::into_signals()
//!                 ▼
//!            Signals (single slot, drop when full)
//!                 │
//!                 ▼
//!   ┌──────────────────────────────┐      now() ──► immediate execution
//!   │ Task::run()                  │◄──── cancel() ─► CancellationToken
//!   │  loop {                      │
//!   │    wait(trigger | now | cx)  │
//!   │    callback(token).await     │──► Event ──► Bus ──► SubscriberSet
//!   │    fan out to subscribe()rs  │
//!   │  }                           │
//!   └──────────────┬───────────────┘
//!                  │ Outlet::try_fire()
//!                  ▼
//!         downstream Task::after(upstream.subscribe())
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──run()──► Waiting ──signal/now()──► Executing ──Ok──► Waiting ...
//!                   │                          │
//!                   │ cancel / source closed   │ once / Err / cancel
//!                   ▼                          ▼
//!                Finished ◄────────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                      |
//! |-------------------|-------------------------------------------------------------|-----------------------------------------|
//! | **Tasks**         | Triggerable, cancellable, chainable units of work.          | [`Task`], [`Callback`], [`TaskState`]   |
//! | **Signals**       | Uniform trigger type and adapters from any source.          | [`Signals`], [`SignalSource`]           |
//! | **Registry**      | Named tasks with bulk run/cancel and graceful shutdown.     | [`Runner`], [`RunnerBuilder`]           |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).      | [`Subscribe`], [`Event`]                |
//! | **Errors**        | Typed errors for configuration, execution and shutdown.     | [`TaskError`], [`RunnerError`]          |
//! | **Configuration** | Runner settings.                                            | [`Config`]                              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasktrigger::{ExitReason, Task, TaskError, signals};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upstream = Task::named("fetch", |_ctx: CancellationToken| async {
//!         println!("fetched");
//!         Ok::<(), TaskError>(())
//!     });
//!     upstream.after(signals::after(Duration::from_millis(5)))?.once();
//!
//!     let downstream = Task::named("index", |_ctx: CancellationToken| async {
//!         println!("indexed");
//!         Ok::<(), TaskError>(())
//!     });
//!     downstream.after(upstream.subscribe())?.once();
//!
//!     let down = tokio::spawn({
//!         let t = downstream.clone();
//!         async move { t.run().await }
//!     });
//!
//!     assert_eq!(upstream.run().await?, ExitReason::Completed);
//!     assert_eq!(down.await??, ExitReason::Completed);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

pub mod signals;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Runner, RunnerBuilder};
pub use error::{RunnerError, RuntimeError, SignalError, TaskError};
pub use events::{Event, EventKind};
pub use signals::{Outlet, Signal, SignalSource, Signals};
pub use subscribers::Subscribe;
pub use tasks::{BoxCallbackFuture, Callback, ExitReason, Task, TaskState};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
