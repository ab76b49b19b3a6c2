//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the internal fan-out set and
//! the optional [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Task / Runner   ── publish(Event) ──► Bus ──► Runner listener ──► SubscriberSet
//!                                                                     │
//!                                                     ┌───────────────┼──────────┐
//!                                                     ▼               ▼          ▼
//!                                                 LogWriter        Metrics    Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use subscriber_set::SubscriberSet;
