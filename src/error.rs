//! Error types used by tasks, signal adapters and the runner.
//!
//! This module defines four enums:
//!
//! - [`SignalError`]: a `SignalSource` refused to produce a signal receiver.
//! - [`TaskError`]: task configuration misuse and callback failures.
//! - [`RunnerError`]: registry misuse (duplicate names).
//! - [`RuntimeError`]: failures of the runner itself, such as a shutdown
//!   exceeding its grace period.
//!
//! All of them provide `as_label` (stable snake_case, for logs/metrics) and
//! `as_message` helpers.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced at the signal adapter boundary.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The source is not readable: it can never produce a signal.
    #[error("invalid signal source: {reason}")]
    InvalidSource {
        /// Why the source was rejected.
        reason: &'static str,
    },
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasktrigger::SignalError;
    ///
    /// let err = SignalError::InvalidSource { reason: "closed" };
    /// assert_eq!(err.as_label(), "signal_invalid_source");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::InvalidSource { .. } => "signal_invalid_source",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SignalError::InvalidSource { reason } => format!("invalid source: {reason}"),
        }
    }
}

/// # Errors produced by task configuration and execution.
///
/// Configuration errors (`TriggerAlreadySet`, `AlreadyRunning`, `InvalidSource`)
/// are returned by the setters and by [`Task::run`](crate::Task::run).
/// Execution errors (`Fail`, `Fatal`, `Canceled`) are returned by callbacks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// A trigger source was already installed on this task.
    #[error("trigger source already set")]
    TriggerAlreadySet,

    /// The task's wait loop is active; it cannot be reconfigured or run twice.
    #[error("task is already running")]
    AlreadyRunning,

    /// The trigger source was rejected by the signal adapter.
    #[error(transparent)]
    InvalidSource(#[from] SignalError),

    /// Callback failed for this execution.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Callback failed in a way the caller should treat as permanent.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Callback observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasktrigger::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::TriggerAlreadySet => "task_trigger_already_set",
            TaskError::AlreadyRunning => "task_already_running",
            TaskError::InvalidSource(_) => "task_invalid_source",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::TriggerAlreadySet => "trigger source already set".to_string(),
            TaskError::AlreadyRunning => "task is already running".to_string(),
            TaskError::InvalidSource(e) => e.as_message(),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the error is a misconfiguration of the task
    /// (as opposed to a failure reported by the callback).
    ///
    /// # Example
    /// ```
    /// use tasktrigger::TaskError;
    ///
    /// assert!(TaskError::TriggerAlreadySet.is_config());
    /// assert!(!TaskError::Canceled.is_config());
    /// ```
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            TaskError::TriggerAlreadySet | TaskError::AlreadyRunning | TaskError::InvalidSource(_)
        )
    }
}

/// # Errors produced by registry operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// A task with this name is already registered; cancel it first.
    #[error("task {name:?} already exists")]
    TaskExists {
        /// The conflicting name.
        name: String,
    },
}

impl RunnerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::TaskExists { .. } => "runner_task_exists",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunnerError::TaskExists { name } => format!("task already exists: {name}"),
        }
    }
}

/// # Errors produced by the runner itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasktrigger::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}
