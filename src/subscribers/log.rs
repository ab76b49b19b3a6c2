//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [added] task="poller"
//! [starting] task="poller" execution=1
//! [stopped] task="poller" execution=1
//! [signal-dropped] task="poller" reason="full"
//! [cancelled] task="poller"
//! [removed] task="poller"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn task(e: &Event) -> &str {
    e.task.as_deref().unwrap_or("-")
}

fn reason(e: &Event) -> &str {
    e.reason.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskAdded => println!("[added] task={:?}", task(e)),
            EventKind::TaskRemoved => println!("[removed] task={:?}", task(e)),
            EventKind::TaskStarting => {
                println!("[starting] task={:?} execution={:?}", task(e), e.execution)
            }
            EventKind::TaskStopped => {
                println!("[stopped] task={:?} execution={:?}", task(e), e.execution)
            }
            EventKind::TaskFailed => println!(
                "[failed] task={:?} err={:?} execution={:?}",
                task(e),
                reason(e),
                e.execution
            ),
            EventKind::TaskCancelled => println!("[cancelled] task={:?}", task(e)),
            EventKind::TriggerClosed => println!("[trigger-closed] task={:?}", task(e)),
            EventKind::SignalDropped => {
                println!("[signal-dropped] task={:?} reason={:?}", task(e), reason(e))
            }
            EventKind::AllStoppedWithin => println!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => println!("[grace-exceeded] stuck={:?}", reason(e)),
            EventKind::SubscriberOverflow => println!(
                "[subscriber-overflow] subscriber={} reason={}",
                task(e),
                reason(e)
            ),
            EventKind::SubscriberPanicked => println!(
                "[subscriber-panicked] subscriber={} info={}",
                task(e),
                reason(e)
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
