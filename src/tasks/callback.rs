//! # Callbacks: the work a task performs.
//!
//! A [`Callback`] is invoked once per execution with the task's
//! [`CancellationToken`] and produces a fresh future each time.
//! Any `Fn(CancellationToken) -> impl Future<Output = Result<(), TaskError>>`
//! closure is a callback.
//!
//! ## Concurrency semantics
//! - Every execution creates a **new** future; no hidden state survives between executions.
//! - Shared state goes into an explicit `Arc<...>` captured by the closure.
//! - The callback is never preempted. Long-running work should `select!` on
//!   `ctx.cancelled()` or poll `ctx.is_cancelled()`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasktrigger::{Task, TaskError};
//!
//! let task = Task::new(|ctx: CancellationToken| async move {
//!     tokio::select! {
//!         _ = ctx.cancelled() => return Err(TaskError::Canceled),
//!         _ = tokio::time::sleep(Duration::from_millis(5)) => {}
//!     }
//!     Ok(())
//! });
//! # let _ = task;
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future returned by [`Callback::call`].
pub type BoxCallbackFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Work performed on every execution of a task.
pub trait Callback: Send + Sync + 'static {
    /// Starts one execution.
    fn call(&self, ctx: CancellationToken) -> BoxCallbackFuture;
}

impl<F, Fut> Callback for F
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn call(&self, ctx: CancellationToken) -> BoxCallbackFuture {
        Box::pin((self)(ctx))
    }
}
