//! # Event subscriber trait.
//!
//! [`Subscribe`] is how callers observe what tasks and the runner do: every
//! execution start and stop, failures, cancellations, dropped completion
//! signals and registry changes arrive as [`Event`]s.
//!
//! A subscriber is attached through
//! [`RunnerBuilder::with_subscribers`](crate::RunnerBuilder::with_subscribers)
//! and receives events from its own bounded queue, one at a time. Events that
//! do not fit the queue are dropped for that subscriber and reported as
//! `EventKind::SubscriberOverflow`; a panic inside `on_event` is reported as
//! `EventKind::SubscriberPanicked` and the worker keeps going.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use tasktrigger::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct DroppedSignals(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for DroppedSignals {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::SignalDropped {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "dropped-signals" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of task and runner events.
///
/// `on_event` runs on a dedicated worker, never on the publishing task, so a
/// slow subscriber only delays itself. Keep it non-blocking and handle errors
/// internally.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events.
    ///
    /// Defaults to `type_name::<Self>()`.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue size for this subscriber; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
