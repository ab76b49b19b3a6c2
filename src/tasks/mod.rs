//! # Task abstractions.
//!
//! This module provides the core task-related types:
//! - [`Task`] - triggerable, cancellable unit of work (shared handle)
//! - [`Callback`] - the work performed on each execution
//! - [`TaskState`] - observable state-machine position
//! - [`ExitReason`] - why `run` returned

mod callback;
mod state;
pub(crate) mod task;

pub use callback::{BoxCallbackFuture, Callback};
pub use state::{ExitReason, TaskState};
pub use task::Task;
