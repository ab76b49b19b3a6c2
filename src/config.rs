//! # Runner configuration.
//!
//! Provides [`Config`], the settings consumed by [`Runner::builder`](crate::Runner::builder).
//!
//! ## Sentinel values
//! - `grace = 0s` → `shutdown` does not wait for launched tasks
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration for a [`Runner`](crate::Runner).
///
/// ## Field semantics
/// - `grace`: maximum wait for launched tasks to return after `shutdown` cancels them
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time `shutdown` waits for cancelled tasks to return.
    ///
    /// Callbacks that never observe their token keep running; once `grace`
    /// elapses their names are reported in `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Subscribers that lag behind more than `bus_capacity` events skip the
    /// oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait at most `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
        }
    }
}
