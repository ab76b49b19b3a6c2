//! # Runner: named registry of tasks.
//!
//! [`Runner`] keeps a `name → Task` map behind a `tokio::sync::RwLock` and
//! offers bulk operations on top of the individual [`Task`] operations.
//!
//! ## Architecture
//! ```text
//! add(name, cb) ──► Task::named ──► map[name]            (TaskAdded)
//! run()         ──► tokio::spawn(task.run()) for each entry not in flight
//! cancel(name)  ──► map.remove(name) ──► task.cancel()   (TaskCancelled, TaskRemoved)
//! cancel_all()  ──► drain ──► cancel each
//! shutdown()    ──► drain ──► cancel each ──► join within grace
//! ```
//!
//! ## Rules
//! - Every map access holds the read or write lock; nothing hands out the live map.
//! - Names are unique. Adding a registered name fails with
//!   [`RunnerError::TaskExists`]; cancel the old task first.
//! - `run` is fire-and-forget and never starts a second `run` of a task still in flight.
//! - A launched task whose `run` returned on its own stays registered until cancelled.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::{RwLock, broadcast::error::RecvError};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::core::builder::RunnerBuilder;
use crate::error::{RunnerError, RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::tasks::{Callback, ExitReason, Task};

type RunHandle = JoinHandle<Result<ExitReason, TaskError>>;

/// Registry entry: the task and, once launched, its join handle.
struct Entry {
    task: Task,
    join: Option<RunHandle>,
}

impl Entry {
    fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }
}

/// Named registry of tasks with bulk run/cancel.
///
/// ## Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use tasktrigger::{Runner, TaskError};
///
/// let runner = Runner::new();
/// runner
///     .add("heartbeat", |_ctx: CancellationToken| async {
///         Ok::<(), TaskError>(())
///     })
///     .await?
///     .after(tasktrigger::signals::every(Duration::from_millis(10)))?;
///
/// runner.run().await;
/// tokio::time::sleep(Duration::from_millis(35)).await;
/// runner.shutdown().await?;
/// assert!(runner.is_empty().await);
/// # Ok(())
/// # }
/// ```
pub struct Runner {
    tasks: RwLock<HashMap<String, Entry>>,
    cfg: Config,
    bus: Bus,
    listener: Option<JoinHandle<()>>,
}

impl Runner {
    /// Creates an empty runner with the default [`Config`] and no subscribers.
    pub fn new() -> Self {
        RunnerBuilder::new(Config::default()).build()
    }

    /// Returns a builder for a runner with custom config and subscribers.
    pub fn builder(cfg: Config) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, bus: Bus, subs: SubscriberSet) -> Self {
        let listener = (!subs.is_empty()).then(|| Self::subscriber_listener(&bus, subs));
        Self {
            tasks: RwLock::new(HashMap::new()),
            cfg,
            bus,
            listener,
        }
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Creates a task from `callback` and registers it under `name`.
    ///
    /// The returned handle can be configured further (`after`, `once`,
    /// `subscribe`) before [`Runner::run`] launches it.
    ///
    /// ### Errors
    /// [`RunnerError::TaskExists`] if `name` is already registered.
    pub async fn add<C: Callback>(
        &self,
        name: impl Into<String>,
        callback: C,
    ) -> Result<Task, RunnerError> {
        let name = name.into();
        let task = Task::named(name.as_str(), callback);
        self.insert(name, task.clone()).await?;
        Ok(task)
    }

    /// Registers an existing task under `name`.
    ///
    /// An unnamed task takes `name` for its events.
    ///
    /// ### Errors
    /// [`RunnerError::TaskExists`] if `name` is already registered.
    pub async fn insert(&self, name: impl Into<String>, task: Task) -> Result<(), RunnerError> {
        let name = name.into();
        {
            let mut tasks = self.tasks.write().await;
            if tasks.contains_key(&name) {
                return Err(RunnerError::TaskExists { name });
            }
            task.name_if_unset(&name);
            task.attach_bus(self.bus.clone());
            tasks.insert(name.clone(), Entry { task, join: None });
        }
        self.bus
            .publish(Event::new(EventKind::TaskAdded).with_task(name));
        Ok(())
    }

    /// Launches every registered task whose `run` is not in flight.
    ///
    /// Tasks whose previous `run` already returned are launched again.
    /// Returns right after dispatch with the number of tasks launched.
    pub async fn run(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let mut launched = 0;
        for entry in tasks.values_mut().filter(|e| !e.is_running()) {
            let task = entry.task.clone();
            entry.join = Some(tokio::spawn(async move { task.run().await }));
            launched += 1;
        }
        launched
    }

    /// Cancels the task registered under `name` and removes it.
    ///
    /// Returns `false` (and does nothing) if no such task exists.
    pub async fn cancel(&self, name: &str) -> bool {
        let entry = self.tasks.write().await.remove(name);
        match entry {
            Some(entry) => {
                entry.task.cancel();
                self.bus
                    .publish(Event::new(EventKind::TaskRemoved).with_task(name));
                true
            }
            None => false,
        }
    }

    /// Cancels and removes every registered task.
    pub async fn cancel_all(&self) {
        for (name, entry) in self.drain().await {
            entry.task.cancel();
            self.bus
                .publish(Event::new(EventKind::TaskRemoved).with_task(name));
        }
    }

    /// Cancels and removes every task, then waits up to [`Config::grace`]
    /// for the launched ones to return.
    ///
    /// ### Errors
    /// [`RuntimeError::GraceExceeded`] with the names of the tasks still
    /// running when the grace period elapsed.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let mut joins: Vec<(String, RunHandle)> = Vec::new();
        for (name, entry) in self.drain().await {
            entry.task.cancel();
            self.bus
                .publish(Event::new(EventKind::TaskRemoved).with_task(name.as_str()));
            if let Some(join) = entry.join {
                joins.push((name, join));
            }
        }

        let Some(grace) = self.cfg.grace_period() else {
            return Ok(());
        };

        let bus = &self.bus;
        let done = tokio::time::timeout(grace, async {
            for (name, join) in joins.iter_mut() {
                Self::join_and_report(bus, name, join).await;
            }
        })
        .await;

        match done {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let mut stuck: Vec<String> = joins
                    .iter()
                    .filter(|(_, join)| !join.is_finished())
                    .map(|(name, _)| name.clone())
                    .collect();
                stuck.sort_unstable();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Returns a handle to the task registered under `name`.
    pub async fn get(&self, name: &str) -> Option<Task> {
        self.tasks.read().await.get(name).map(|e| e.task.clone())
    }

    /// Returns a snapshot of the registry.
    ///
    /// Changes to the returned map do not affect the runner.
    pub async fn all(&self) -> HashMap<String, Task> {
        self.tasks
            .read()
            .await
            .iter()
            .map(|(name, e)| (name.clone(), e.task.clone()))
            .collect()
    }

    /// Returns sorted list of registered task names.
    pub async fn list(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        let mut names: Vec<String> = tasks.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns true if registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Returns true if a `run` launched by the runner is in flight for `name`.
    pub async fn is_launched(&self, name: &str) -> bool {
        self.tasks
            .read()
            .await
            .get(name)
            .is_some_and(Entry::is_running)
    }

    async fn drain(&self) -> Vec<(String, Entry)> {
        self.tasks.write().await.drain().collect()
    }

    /// Awaits a launched task and reports a panic as `TaskFailed(task_panic)`.
    async fn join_and_report(bus: &Bus, name: &str, join: &mut RunHandle) {
        if let Err(je) = join.await {
            if je.is_panic() {
                bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(name)
                        .with_reason("task_panic"),
                );
            }
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn counting(hits: &Arc<AtomicUsize>) -> impl Callback {
        let hits = Arc::clone(hits);
        move |_ctx: CancellationToken| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let first = runner.add("t1", counting(&hits)).await.expect("add");

        let err = runner.add("t1", counting(&hits)).await.expect_err("dup");
        assert_eq!(err, RunnerError::TaskExists { name: "t1".into() });
        assert!(runner.get("t1").await.expect("kept").ptr_eq(&first));
    }

    #[tokio::test]
    async fn cancel_removes_and_ignores_unknown() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let task = runner.add("t1", counting(&hits)).await.expect("add");

        assert!(!runner.cancel("nope").await);
        assert!(runner.cancel("t1").await);
        assert!(task.is_cancelled());
        assert!(runner.get("t1").await.is_none());
        assert!(!runner.cancel("t1").await);
    }

    #[tokio::test]
    async fn all_is_a_snapshot() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        runner.add("b", counting(&hits)).await.expect("add");
        runner.add("a", counting(&hits)).await.expect("add");

        let mut snapshot = runner.all().await;
        snapshot.clear();

        assert_eq!(runner.len().await, 2);
        assert_eq!(runner.list().await, vec!["a".to_string(), "b".to_string()]);
    }

    fn waiting(hits: &Arc<AtomicUsize>) -> Task {
        let task = Task::new(counting(hits));
        task.after(crate::signals::every(Duration::from_secs(3600)))
            .expect("after");
        task
    }

    async fn until_finished(task: &Task) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while task.state() != crate::TaskState::Finished {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("run returned");
    }

    #[tokio::test]
    async fn run_skips_tasks_in_flight() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        runner.insert("w", waiting(&hits)).await.expect("insert");

        assert_eq!(runner.run().await, 1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(runner.is_launched("w").await);
        assert_eq!(runner.run().await, 0);

        runner.cancel_all().await;
    }

    #[tokio::test]
    async fn run_relaunches_finished_tasks() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let task = runner.add("t", counting(&hits)).await.expect("add");

        assert_eq!(runner.run().await, 1);
        until_finished(&task).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!runner.is_launched("t").await);

        assert_eq!(runner.run().await, 1);
        tokio::time::timeout(Duration::from_secs(1), async {
            while hits.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("second execution");
        assert_eq!(task.executions(), 2);
    }

    #[tokio::test]
    async fn cancel_all_stops_and_removes_every_task() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let a = waiting(&hits);
        let b = waiting(&hits);
        runner.insert("a", a.clone()).await.expect("insert");
        runner.insert("b", b.clone()).await.expect("insert");

        runner.run().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut rx = runner.bus.subscribe();
        runner.cancel_all().await;

        assert!(a.is_cancelled() && b.is_cancelled());
        assert!(runner.is_empty().await);
        until_finished(&a).await;
        until_finished(&b).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let mut removed = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::TaskRemoved {
                removed.push(ev.task.as_deref().map(str::to_string));
            }
        }
        removed.sort();
        assert_eq!(removed, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[tokio::test]
    async fn insert_names_unnamed_tasks() {
        let runner = Runner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let task = Task::new(counting(&hits));

        runner.insert("adopted", task.clone()).await.expect("insert");
        assert_eq!(task.name(), Some("adopted"));
    }

    #[tokio::test]
    async fn shutdown_reports_stuck_tasks() {
        let cfg = Config {
            grace: Duration::from_millis(50),
            ..Config::default()
        };
        let runner = Runner::builder(cfg).build();
        runner
            .add("stubborn", |_ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<(), TaskError>(())
            })
            .await
            .expect("add");
        runner
            .add("polite", |ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Err::<(), TaskError>(TaskError::Canceled)
            })
            .await
            .expect("add");

        runner.run().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        match runner.shutdown().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, vec!["stubborn".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(runner.is_empty().await);
    }
}
