//! # Lifecycle events emitted by tasks and the runner.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Execution events**: one task's trigger/execute/cancel flow
//! - **Registry events**: tasks added to or removed from a runner
//! - **Delivery events**: shutdown outcome and subscriber health
//!
//! The [`Event`] struct carries metadata such as timestamps, task name,
//! reasons and the execution counter.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tasktrigger::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("demo-task")
//!     .with_reason("boom")
//!     .with_execution(3);
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("demo-task"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! assert_eq!(ev.execution, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// All launched tasks returned within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not return in time.
    ///
    /// Sets:
    /// - `reason`: names of the stuck tasks
    GraceExceeded,

    // === Execution events ===
    /// Callback is about to be invoked.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `execution`: execution number (1-based, per task)
    TaskStarting,

    /// Callback returned successfully; completion signals were published.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `execution`: execution number
    TaskStopped,

    /// Callback returned an error; the wait loop stops.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `execution`: execution number
    /// - `reason`: failure message
    TaskFailed,

    /// Task was cancelled (first `cancel` call only).
    ///
    /// Sets:
    /// - `task`: task name
    TaskCancelled,

    /// Trigger source was exhausted; the wait loop ended.
    ///
    /// Sets:
    /// - `task`: task name
    TriggerClosed,

    /// A completion signal could not be delivered to a subscriber outlet.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: "full" or "closed"
    SignalDropped,

    // === Registry events ===
    /// Task was registered under a name.
    ///
    /// Sets:
    /// - `task`: task name
    TaskAdded,

    /// Task was cancelled and removed from the registry.
    ///
    /// Sets:
    /// - `task`: task name
    TaskRemoved,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, drop details, etc.).
    pub reason: Option<Arc<str>>,
    /// Execution count (starting from 1).
    pub execution: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            execution: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an optional task name (unnamed tasks publish without one).
    #[inline]
    pub(crate) fn with_task_opt(mut self, task: Option<&Arc<str>>) -> Self {
        self.task = task.cloned();
        self
    }

    /// Attaches an execution count.
    #[inline]
    pub fn with_execution(mut self, n: u32) -> Self {
        self.execution = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Returns `true` if a subscriber panicked while handling an event.
    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
