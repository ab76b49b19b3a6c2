//! # Task: a triggerable, cancellable unit of deferred work.
//!
//! A [`Task`] wraps a [`Callback`] together with:
//! - an optional **trigger** ([`Signals`]) installed by [`Task::after`],
//! - a **once** flag,
//! - **subscriber outlets** that receive a completion signal after every
//!   successful execution ([`Task::subscribe`]),
//! - a [`CancellationToken`], cancelled by [`Task::cancel`] and handed to the callback.
//!
//! `Task` is a cheap handle (`Arc` inside): clones share the same state, so a
//! caller and a [`Runner`](crate::Runner) can both hold it.
//!
//! ## Configuration rules
//! - Configure before awaiting [`Task::run`].
//! - The trigger can be installed once. A second [`Task::after`] returns
//!   [`TaskError::TriggerAlreadySet`]; calling it while `run` is active
//!   returns [`TaskError::AlreadyRunning`].
//! - Subscriptions only receive completions of executions that start after
//!   they were made (no replay).
//!
//! ## Example
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tasktrigger::TaskError> {
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tokio_util::sync::CancellationToken;
//! use tasktrigger::{ExitReason, Task, TaskError};
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let h = hits.clone();
//! let first = Task::new(move |_ctx: CancellationToken| {
//!     let h = h.clone();
//!     async move {
//!         h.fetch_add(1, Ordering::SeqCst);
//!         Ok::<(), TaskError>(())
//!     }
//! });
//!
//! let h = hits.clone();
//! let second = Task::new(move |_ctx: CancellationToken| {
//!     let h = h.clone();
//!     async move {
//!         h.fetch_add(1, Ordering::SeqCst);
//!         Ok::<(), TaskError>(())
//!     }
//! });
//! second.after(first.subscribe())?.once();
//!
//! assert_eq!(first.run().await?, ExitReason::Executed);
//! assert_eq!(second.run().await?, ExitReason::Completed);
//! assert_eq!(hits.load(Ordering::SeqCst), 2);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::runner;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::signals::{self, OUTLET_CAPACITY, Outlet, Signal, SignalSource, Signals};
use crate::tasks::callback::Callback;
use crate::tasks::state::{ExitReason, StateCell, TaskState};

/// Shared, cheaply clonable handle to a task.
#[derive(Clone)]
pub struct Task {
    pub(crate) inner: Arc<Inner>,
}

/// State owned by the wait loop while `run` is active.
pub(crate) struct WaitSlot {
    /// Installed trigger; `None` means "execute immediately".
    pub(crate) trigger: Option<Signals>,
    /// Signals injected by [`Task::now`].
    pub(crate) now_rx: mpsc::UnboundedReceiver<Signal>,
}

pub(crate) struct Inner {
    pub(crate) name: OnceLock<Arc<str>>,
    pub(crate) callback: Box<dyn Callback>,
    pub(crate) cancel: CancellationToken,
    cancel_reported: AtomicBool,
    pub(crate) once: AtomicBool,
    has_trigger: AtomicBool,
    /// Locked for the whole duration of `run`.
    pub(crate) wait: tokio::sync::Mutex<WaitSlot>,
    now_tx: mpsc::UnboundedSender<Signal>,
    pub(crate) subscribers: Mutex<Vec<Outlet>>,
    pub(crate) state: StateCell,
    pub(crate) running: AtomicBool,
    pub(crate) executions: AtomicU32,
    pub(crate) last_run_start: Mutex<Option<Instant>>,
    bus: OnceLock<Bus>,
}

impl Inner {
    /// Publishes `ev` tagged with the task name, if a bus is attached.
    pub(crate) fn publish(&self, ev: Event) {
        if let Some(bus) = self.bus.get() {
            bus.publish(ev.with_task_opt(self.name.get()));
        }
    }
}

impl Task {
    /// Creates an unnamed task. Without [`Task::after`], `run` executes `callback` once.
    pub fn new<C: Callback>(callback: C) -> Self {
        let (now_tx, now_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                name: OnceLock::new(),
                callback: Box::new(callback),
                cancel: CancellationToken::new(),
                cancel_reported: AtomicBool::new(false),
                once: AtomicBool::new(false),
                has_trigger: AtomicBool::new(false),
                wait: tokio::sync::Mutex::new(WaitSlot {
                    trigger: None,
                    now_rx,
                }),
                now_tx,
                subscribers: Mutex::new(Vec::new()),
                state: StateCell::new(),
                running: AtomicBool::new(false),
                executions: AtomicU32::new(0),
                last_run_start: Mutex::new(None),
                bus: OnceLock::new(),
            }),
        }
    }

    /// Creates a task with a name used in lifecycle events.
    pub fn named<C: Callback>(name: impl Into<Arc<str>>, callback: C) -> Self {
        let task = Self::new(callback);
        let _ = task.inner.name.set(name.into());
        task
    }

    /// Installs the trigger: every signal from `source` causes one execution.
    ///
    /// `source` is adapted through [`SignalSource`]; see [`crate::signals`].
    ///
    /// ### Errors
    /// - [`TaskError::AlreadyRunning`] while `run` is active
    /// - [`TaskError::TriggerAlreadySet`] if a trigger was installed before
    /// - [`TaskError::InvalidSource`] if the source rejects adaptation
    pub fn after<S: SignalSource>(&self, source: S) -> Result<&Self, TaskError> {
        let mut slot = self
            .inner
            .wait
            .try_lock()
            .map_err(|_| TaskError::AlreadyRunning)?;
        if self.inner.has_trigger.load(Ordering::Acquire) {
            return Err(TaskError::TriggerAlreadySet);
        }

        slot.trigger = Some(source.into_signals()?);
        self.inner.has_trigger.store(true, Ordering::Release);
        Ok(self)
    }

    /// Requests one execution through the trigger, as if it had fired.
    ///
    /// The signal is queued for the wait loop; nothing executes synchronously.
    /// No-op if no trigger is installed. Requests queued when the trigger
    /// closes are still executed before `run` returns.
    pub fn now(&self) -> &Self {
        if self.inner.has_trigger.load(Ordering::Acquire) {
            let _ = self.inner.now_tx.send(Signal);
        }
        self
    }

    /// Marks the task single-shot: the wait loop ends after the first successful execution.
    pub fn once(&self) -> &Self {
        self.inner.once.store(true, Ordering::Release);
        self
    }

    /// Registers a completion outlet and returns its receiving side.
    ///
    /// After each successful execution the task tries to place one signal
    /// into every outlet; an outlet still holding an unread signal misses it.
    /// Pass the result to another task's [`Task::after`] to chain them.
    pub fn subscribe(&self) -> Signals {
        let (outlet, signals) = signals::channel(OUTLET_CAPACITY);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outlet);
        signals
    }

    /// Cancels the task. Safe to call any number of times, from any thread.
    ///
    /// A waiting `run` returns [`ExitReason::Cancelled`]; a running callback
    /// only stops if it observes its token.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
        if !self.inner.cancel_reported.swap(true, Ordering::AcqRel) {
            self.inner.publish(Event::new(EventKind::TaskCancelled));
        }
    }

    /// Runs the task until it completes, is cancelled, or its trigger is exhausted.
    ///
    /// - No trigger: the callback runs once, then `Ok(ExitReason::Executed)`.
    /// - Trigger: waits for a signal or cancellation; each signal runs the
    ///   callback, then the loop continues unless the task is once.
    ///
    /// If cancellation and a signal are ready together, either may win.
    ///
    /// ### Errors
    /// - [`TaskError::AlreadyRunning`] if another `run` on this task is active
    /// - the callback's error (`Fail`/`Fatal`), which stops the loop
    pub async fn run(&self) -> Result<ExitReason, TaskError> {
        runner::run(&self.inner).await
    }

    /// Task name, if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.get().map(|n| n.as_ref())
    }

    /// Returns `true` once [`Task::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Returns `true` while the callback executes.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Current state-machine position.
    pub fn state(&self) -> TaskState {
        self.inner.state.get()
    }

    /// Number of executions started so far.
    pub fn executions(&self) -> u32 {
        self.inner.executions.load(Ordering::Acquire)
    }

    /// Start instant of the most recent execution.
    pub fn last_run_start(&self) -> Option<Instant> {
        *self
            .inner
            .last_run_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if a trigger was installed.
    pub fn has_trigger(&self) -> bool {
        self.inner.has_trigger.load(Ordering::Acquire)
    }

    /// Returns `true` if the task is single-shot.
    pub fn is_once(&self) -> bool {
        self.inner.once.load(Ordering::Acquire)
    }

    /// A clone of the cancellation token handed to the callback.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Names the task if it has no name yet.
    pub(crate) fn name_if_unset(&self, name: &str) {
        let _ = self.inner.name.set(Arc::from(name));
    }

    /// Routes this task's lifecycle events to `bus` (first attachment wins).
    pub(crate) fn attach_bus(&self, bus: Bus) {
        let _ = self.inner.bus.set(bus);
    }

    /// Returns `true` if both handles point to the same task.
    pub fn ptr_eq(&self, other: &Task) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("once", &self.is_once())
            .field("cancelled", &self.is_cancelled())
            .field("executions", &self.executions())
            .finish_non_exhaustive()
    }
}
