//! Task states and exit reasons.

use std::sync::atomic::{AtomicU8, Ordering};

/// Observable position of a task in its state machine.
///
/// ```text
/// Idle ──run()──► Executing ──► Finished            (no trigger)
/// Idle ──run()──► Waiting ⇄ Executing ──► Finished  (trigger installed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// `run` has not been called yet.
    Idle = 0,
    /// Waiting for a trigger signal or cancellation.
    Waiting = 1,
    /// Callback in progress.
    Executing = 2,
    /// `run` returned.
    Finished = 3,
}

impl TaskState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => TaskState::Waiting,
            2 => TaskState::Executing,
            3 => TaskState::Finished,
            _ => TaskState::Idle,
        }
    }
}

/// Why [`Task::run`](crate::Task::run) returned successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// No trigger was installed; the callback ran once.
    Executed,
    /// A once-task executed after its trigger fired.
    Completed,
    /// Cancellation was observed (while waiting, or reported by the callback).
    Cancelled,
    /// The trigger source was exhausted.
    SourceClosed,
}

/// Lock-free cell holding a [`TaskState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(TaskState::Idle as u8))
    }

    pub(crate) fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: TaskState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
