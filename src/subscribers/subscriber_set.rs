//! # Fan-out of bus events to user subscribers.
//!
//! Every subscriber owns a lane: a bounded queue drained by one worker.
//! [`SubscriberSet::emit`] pushes into all lanes with `try_send`, so the bus
//! listener never waits for a subscriber.
//!
//! ```text
//! emit(ev) ─┬─ lane "audit"   [cap] ──► worker ──► on_event
//!           └─ lane "metrics" [cap] ──► worker ──► on_event
//!                 full/closed ──► SubscriberOverflow on the bus
//!                 panic       ──► SubscriberPanicked on the bus
//! ```
//!
//! Order is FIFO within a lane and unspecified across lanes.
//! `on_event` is wrapped in `AssertUnwindSafe`: a subscriber that panics while
//! holding a lock may leave its own state inconsistent.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Per-subscriber lanes plus the bus used to report overflow and panics.
pub(crate) struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Opens one lane per subscriber; spawns nothing when `subs` is empty.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| {
                let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
                Lane {
                    name: sub.name(),
                    queue,
                    worker: tokio::spawn(drain_lane(sub, rx, bus.clone())),
                }
            })
            .collect();
        Self { lanes, bus }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Offers `event` to every lane without waiting.
    ///
    /// An overflow event that itself overflows is not reported again.
    pub(crate) fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.queue.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if event.kind != EventKind::SubscriberOverflow {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes every lane and waits until the workers have drained them.
    pub(crate) async fn shutdown(self) {
        let mut workers = Vec::with_capacity(self.lanes.len());
        for lane in self.lanes {
            drop(lane.queue);
            workers.push(lane.worker);
        }
        for worker in workers {
            let _ = worker.await;
        }
    }
}

async fn drain_lane(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let delivery = std::panic::AssertUnwindSafe(sub.on_event(&ev)).catch_unwind();
        if let Err(payload) = delivery.await {
            let info = panic_message(payload.as_ref());
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
