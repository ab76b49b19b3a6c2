//! # Wait loop and execution of a single task.
//!
//! Drives one [`Task`](crate::Task) through its state machine and publishes
//! lifecycle events.
//!
//! ## Event flow
//! ```text
//! No trigger:
//!   exec() ──► Executed
//!
//! Trigger:
//!   loop {
//!     select! {
//!       cancelled()     ──► Cancelled
//!       trigger.recv()  ──► Some ─► exec() ─► once? Completed : loop
//!                       └─► None ─► queued now()? exec() : TriggerClosed ─► SourceClosed
//!       now_rx.recv()   ──► exec() ─► once? Completed : loop
//!     }
//!   }
//!
//! exec():
//!   TaskStarting ─► callback(token) ─► Ok       ─► TaskStopped ─► fan-out
//!                                    ├► Canceled ─► TaskStopped ─► Cancelled
//!                                    └► Err      ─► TaskFailed  ─► return Err
//! ```
//!
//! ## Rules
//! - The callback runs on the caller's async context, never spawned.
//! - Fan-out happens after the callback returned and before the next wait.
//! - Fan-out never blocks: an outlet with a pending signal misses this one.
//! - The wait slot stays locked while `run` is active (second `run` → `AlreadyRunning`).

use std::sync::PoisonError;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::signals::Dropped;
use crate::tasks::{ExitReason, TaskState};
use crate::tasks::task::{Inner, WaitSlot};

/// Marks the task `Finished` when `run` returns or unwinds.
struct FinishGuard<'a>(&'a Inner);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        self.0.state.set(TaskState::Finished);
    }
}

/// Runs the task's state machine to completion.
pub(crate) async fn run(task: &Inner) -> Result<ExitReason, TaskError> {
    let mut guard = task
        .wait
        .try_lock()
        .map_err(|_| TaskError::AlreadyRunning)?;
    let _finish = FinishGuard(task);

    let WaitSlot { trigger, now_rx } = &mut *guard;
    let Some(trigger) = trigger.as_mut() else {
        return match exec(task).await {
            Ok(()) => Ok(ExitReason::Executed),
            Err(TaskError::Canceled) => Ok(ExitReason::Cancelled),
            Err(e) => Err(e),
        };
    };

    loop {
        task.state.set(TaskState::Waiting);

        let fired = tokio::select! {
            _ = task.cancel.cancelled() => return Ok(ExitReason::Cancelled),
            sig = trigger.recv() => sig.is_some(),
            Some(_) = now_rx.recv() => true,
        };

        // An exhausted trigger still honours `now()` requests queued before it closed.
        if !fired && now_rx.try_recv().is_err() {
            task.publish(Event::new(EventKind::TriggerClosed));
            return Ok(ExitReason::SourceClosed);
        }

        match exec(task).await {
            Ok(()) if task.once.load(Ordering::Acquire) => return Ok(ExitReason::Completed),
            Ok(()) => {}
            Err(TaskError::Canceled) => return Ok(ExitReason::Cancelled),
            Err(e) => return Err(e),
        }
    }
}

/// One execution: callback, then completion fan-out on success.
async fn exec(task: &Inner) -> Result<(), TaskError> {
    let n = task.executions.fetch_add(1, Ordering::AcqRel).saturating_add(1);
    task.state.set(TaskState::Executing);
    task.running.store(true, Ordering::Release);
    *task
        .last_run_start
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    task.publish(Event::new(EventKind::TaskStarting).with_execution(n));

    let res = task.callback.call(task.cancel.clone()).await;
    task.running.store(false, Ordering::Release);

    match res {
        Ok(()) => {
            task.publish(Event::new(EventKind::TaskStopped).with_execution(n));
            fan_out(task);
            Ok(())
        }
        Err(TaskError::Canceled) => {
            task.publish(
                Event::new(EventKind::TaskStopped)
                    .with_execution(n)
                    .with_reason("cancelled"),
            );
            Err(TaskError::Canceled)
        }
        Err(e) => {
            task.publish(
                Event::new(EventKind::TaskFailed)
                    .with_execution(n)
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}

/// Tries to deliver one completion signal to every subscriber outlet.
fn fan_out(task: &Inner) {
    let dropped: Vec<Dropped> = {
        let outlets = task
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        outlets.iter().filter_map(|o| o.try_fire().err()).collect()
    };

    for reason in dropped {
        task.publish(Event::new(EventKind::SignalDropped).with_reason(reason.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::events::{Bus, EventKind};
    use crate::signals::{self, Signal};
    use crate::{ExitReason, Task, TaskError, TaskState};

    fn counting(hits: &Arc<AtomicUsize>) -> Task {
        let hits = Arc::clone(hits);
        Task::named("counter", move |_ctx: CancellationToken| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        })
    }

    fn count(hits: &Arc<AtomicUsize>) -> usize {
        hits.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[tokio::test]
    async fn no_trigger_executes_once_per_run() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);

        assert_eq!(task.run().await.expect("run"), ExitReason::Executed);
        assert_eq!(count(&hits), 1);
        assert_eq!(task.run().await.expect("run"), ExitReason::Executed);
        assert_eq!(count(&hits), 2);
        assert_eq!(task.state(), TaskState::Finished);
        assert!(task.last_run_start().is_some());
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn once_executes_once_for_many_signals() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);

        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        for i in 0..5 {
            tx.send(i).expect("send");
        }
        task.after(rx).expect("after").once();

        assert_eq!(task.run().await.expect("run"), ExitReason::Completed);
        assert_eq!(count(&hits), 1);
    }

    #[tokio::test]
    async fn repeat_executes_per_signal_until_cancelled() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        let (outlet, signals) = signals::channel(1);
        task.after(signals).expect("after");

        let runner = task.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        for expected in 1..=3 {
            assert!(outlet.fire().await);
            tokio::time::timeout(Duration::from_secs(1), async {
                while count(&hits) < expected {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            })
            .await
            .expect("execution");
        }

        task.cancel();
        let reason = handle.await.expect("join").expect("run");
        assert_eq!(reason, ExitReason::Cancelled);
        assert_eq!(count(&hits), 3);
    }

    #[tokio::test]
    async fn cancel_before_signal_never_executes() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        let (_outlet, signals) = signals::channel(1);
        task.after(signals).expect("after");

        task.cancel();
        assert_eq!(task.run().await.expect("run"), ExitReason::Cancelled);
        assert_eq!(count(&hits), 0);
    }

    #[tokio::test]
    async fn exhausted_trigger_ends_loop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        let (outlet, signals) = signals::channel(1);
        outlet.try_fire().expect("slot");
        drop(outlet);
        task.after(signals).expect("after");

        assert_eq!(task.run().await.expect("run"), ExitReason::SourceClosed);
        assert_eq!(count(&hits), 1);
    }

    #[tokio::test]
    async fn queued_now_survives_closed_trigger() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        let (outlet, signals) = signals::channel(1);
        drop(outlet);
        task.after(signals).expect("after");
        task.now().now();

        assert_eq!(task.run().await.expect("run"), ExitReason::SourceClosed);
        assert_eq!(count(&hits), 2);
    }

    #[tokio::test]
    async fn now_injects_one_execution() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        task.after(signals::every(Duration::from_secs(3600)))
            .expect("after")
            .once()
            .now();

        assert_eq!(task.run().await.expect("run"), ExitReason::Completed);
        assert_eq!(count(&hits), 1);
    }

    #[tokio::test]
    async fn failure_stops_loop_without_completion_signal() {
        let task = Task::new(|_ctx: CancellationToken| async {
            Err::<(), TaskError>(TaskError::Fail { error: "boom".into() })
        });
        let mut completions = task.subscribe();
        let (outlet, signals) = signals::channel(1);
        outlet.try_fire().expect("slot");
        task.after(signals).expect("after");

        let err = task.run().await.expect_err("callback failed");
        assert_eq!(err.as_label(), "task_failed");
        assert!(completions.try_recv().is_err());
        assert_eq!(task.executions(), 1);
    }

    #[tokio::test]
    async fn callback_reported_cancellation_is_graceful() {
        let task = Task::new(|ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), TaskError>(TaskError::Canceled)
        });

        let runner = task.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(task.is_running());
        assert_eq!(task.state(), TaskState::Executing);

        task.cancel();
        let reason = handle.await.expect("join").expect("run");
        assert_eq!(reason, ExitReason::Cancelled);
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn completion_fans_out_and_drops_when_full() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        task.attach_bus(bus);

        let mut a = task.subscribe();
        let mut b = task.subscribe();

        task.run().await.expect("run");
        task.run().await.expect("run");

        assert_eq!(a.try_recv(), Ok(Signal));
        assert!(a.try_recv().is_err());
        assert_eq!(b.try_recv(), Ok(Signal));

        let mut dropped = 0;
        while let Ok(ev) = events.try_recv() {
            assert_eq!(ev.task.as_deref(), Some("counter"));
            if ev.kind == EventKind::SignalDropped {
                assert_eq!(ev.reason.as_deref(), Some("full"));
                dropped += 1;
            }
        }
        assert_eq!(dropped, 2);
    }

    #[tokio::test]
    async fn late_subscription_gets_no_replay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task = counting(&hits);
        task.run().await.expect("run");

        let mut late = task.subscribe();
        assert!(late.try_recv().is_err());
    }
}
