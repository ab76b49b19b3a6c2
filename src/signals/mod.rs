//! # Signals: the uniform trigger type and its adapters.
//!
//! - [`Signal`], [`Signals`], [`Outlet`], [`channel`] - the uniform channel
//! - [`SignalSource`] - adapter from any readable source (channels, timers, streams)
//! - [`after`], [`every`], [`on`], [`from_stream`] - ready-made sources
//!
//! Delivery is best-effort everywhere: a signal that finds no free slot is
//! dropped, never queued.
//!
//! Outputs are single-slot buffers, not rendezvous channels: tokio has no
//! zero-capacity `mpsc`. One signal is therefore held even while nobody is
//! reading, and a reader that arrives later still receives it. Only signals
//! arriving while that slot is occupied are dropped.

mod adapter;
mod signal;

pub use adapter::{FromStream, MIN_PERIOD, SignalSource, after, every, from_stream, on};
pub use signal::{Dropped, OUTLET_CAPACITY, Outlet, Signal, Signals, TryRecvError, channel};
