//! # Signal adapter: any readable source → [`Signals`].
//!
//! [`SignalSource`] converts a readable event source into the uniform
//! [`Signals`] receiver, whatever the element type of the source.
//!
//! ## Rules
//! - [`Signals`] is returned unchanged (no forwarding task).
//! - Every other source gets a forwarding task that reads it and **tries**
//!   to place one signal into a fresh single-slot output. A value that finds
//!   the slot occupied is dropped: the source is never slowed down by the
//!   reader.
//! - When the source is exhausted the output is closed; a blocked reader
//!   then observes `None`.
//! - When the output is dropped the forwarding task stops reading.
//!
//! ## Diagram
//! ```text
//! source ──► forwarder ──try_send──► [slot] ──► Signals::recv()
//!                 └── slot full → value dropped
//! ```
//!
//! Adapting spawns onto the current tokio runtime.

use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt, stream};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::SignalError;
use crate::signals::signal::{Signals, channel};

/// A readable event source that can drive a task.
///
/// ## Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use tasktrigger::signals::{Signal, SignalSource};
///
/// let (tx, rx) = tokio::sync::mpsc::channel::<u64>(1);
/// tx.send(42).await.unwrap();
/// drop(tx);
///
/// let mut signals = rx.into_signals().unwrap();
/// assert_eq!(signals.recv().await, Some(Signal));
/// assert_eq!(signals.recv().await, None);
/// # }
/// ```
///
/// Every built-in source is accepted; an exhausted one simply yields a
/// closed [`Signals`]. Custom implementations return
/// [`SignalError::InvalidSource`] for sources that cannot be read at all.
pub trait SignalSource: Send + 'static {
    /// Normalizes this source into the uniform signal receiver.
    fn into_signals(self) -> Result<Signals, SignalError>;
}

impl SignalSource for Signals {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(self)
    }
}

impl<T: Send + 'static> SignalSource for mpsc::Receiver<T> {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::unfold(self, |mut rx| async move {
            rx.recv().await.map(|v| (v, rx))
        })))
    }
}

impl<T: Send + 'static> SignalSource for mpsc::UnboundedReceiver<T> {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::unfold(self, |mut rx| async move {
            rx.recv().await.map(|v| (v, rx))
        })))
    }
}

/// Lagged values are skipped; the source ends when every sender is gone.
impl<T: Clone + Send + 'static> SignalSource for broadcast::Receiver<T> {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::unfold(self, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(v) => return Some((v, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })))
    }
}

/// One signal if a value is sent; none if the sender is dropped.
impl<T: Send + 'static> SignalSource for oneshot::Receiver<T> {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::once(self).filter_map(|res| async move { res.ok() })))
    }
}

/// One signal per observed change.
impl<T: Send + Sync + 'static> SignalSource for watch::Receiver<T> {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::unfold(self, |mut rx| async move {
            rx.changed().await.ok().map(|()| ((), rx))
        })))
    }
}

/// One signal per tick; never exhausted.
impl SignalSource for Interval {
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(stream::unfold(self, |mut interval| async move {
            let at = interval.tick().await;
            Some((at, interval))
        })))
    }
}

/// Adapts an arbitrary [`Stream`]; built by [`from_stream`].
#[derive(Debug)]
pub struct FromStream<S>(S);

impl<S> SignalSource for FromStream<S>
where
    S: Stream + Send + 'static,
    S::Item: Send,
{
    fn into_signals(self) -> Result<Signals, SignalError> {
        Ok(forward(self.0))
    }
}

/// Wraps any stream so it can be used as a trigger source.
pub fn from_stream<S>(stream: S) -> FromStream<S>
where
    S: Stream + Send + 'static,
    S::Item: Send,
{
    FromStream(stream)
}

/// One-shot timer: a single signal after `delay`, then exhausted.
pub fn after(delay: Duration) -> Signals {
    forward(stream::once(time::sleep(delay)))
}

/// Shortest period accepted by [`every`]; smaller periods are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic timer: the first signal arrives one `period` from now.
///
/// Missed ticks are skipped rather than bursted. A `period` below
/// [`MIN_PERIOD`] (including zero) is raised to [`MIN_PERIOD`].
pub fn every(period: Duration) -> Signals {
    let period = period.max(MIN_PERIOD);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    forward(stream::unfold(interval, |mut interval| async move {
        let at = interval.tick().await;
        Some((at, interval))
    }))
}

/// One signal when `fut` completes.
pub fn on<F>(fut: F) -> Signals
where
    F: Future + Send + 'static,
    F::Output: Send,
{
    forward(stream::once(fut))
}

/// Spawns the forwarding task and returns the single-slot output.
fn forward<S>(source: S) -> Signals
where
    S: Stream + Send + 'static,
    S::Item: Send,
{
    let (outlet, signals) = channel(1);

    tokio::spawn(async move {
        let mut source = std::pin::pin!(source);
        loop {
            tokio::select! {
                _ = outlet.closed() => break,
                item = source.next() => match item {
                    Some(_) => {
                        let _ = outlet.try_fire();
                    }
                    None => break,
                },
            }
        }
    });

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Signal, TryRecvError};

    #[tokio::test]
    async fn uniform_source_passes_through() {
        let (outlet, signals) = crate::signals::channel(2);
        let mut adapted = signals.into_signals().expect("passthrough");

        outlet.try_fire().expect("slot");
        outlet.try_fire().expect("slot");
        assert_eq!(adapted.recv().await, Some(Signal));
        assert_eq!(adapted.recv().await, Some(Signal));
    }

    #[tokio::test]
    async fn single_element_source_yields_once_then_closes() {
        let (tx, rx) = mpsc::channel::<String>(1);
        tx.send("payload".to_string()).await.expect("send");
        drop(tx);

        let mut signals = rx.into_signals().expect("readable");
        assert_eq!(signals.recv().await, Some(Signal));
        assert_eq!(signals.recv().await, None);
        assert_eq!(signals.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn values_without_ready_reader_are_dropped() {
        let (tx, rx) = mpsc::channel::<u8>(8);
        for i in 0..5 {
            tx.send(i).await.expect("send");
        }
        drop(tx);

        let mut signals = rx.into_signals().expect("readable");
        // Current-thread runtime: the forwarder drains the source while we sleep.
        time::sleep(Duration::from_millis(20)).await;

        assert_eq!(signals.recv().await, Some(Signal));
        assert_eq!(signals.recv().await, None);
    }

    #[tokio::test]
    async fn exhausted_channel_yields_closed_output() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        drop(tx);
        let mut signals = rx.into_signals().expect("readable");
        assert_eq!(signals.recv().await, None);

        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        drop(tx);
        let mut signals = rx.into_signals().expect("readable");
        assert_eq!(signals.recv().await, None);
        assert_eq!(signals.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn closed_channel_with_pending_value_is_accepted() {
        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        tx.send(1).expect("send");
        drop(tx);

        let mut signals = rx.into_signals().expect("still readable");
        assert_eq!(signals.recv().await, Some(Signal));
        assert_eq!(signals.recv().await, None);
    }

    #[tokio::test]
    async fn oneshot_yields_only_on_value() {
        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).expect("send");
        let mut signals = rx.into_signals().expect("readable");
        assert_eq!(signals.recv().await, Some(Signal));
        assert_eq!(signals.recv().await, None);

        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let mut signals = rx.into_signals().expect("readable");
        assert_eq!(signals.recv().await, None);
    }

    #[tokio::test]
    async fn broadcast_and_watch_sources() {
        let (tx, rx) = broadcast::channel::<&'static str>(4);
        let mut signals = rx.into_signals().expect("readable");
        tx.send("go").expect("send");
        assert_eq!(signals.recv().await, Some(Signal));
        drop(tx);
        assert_eq!(signals.recv().await, None);

        let (tx, rx) = watch::channel(0u32);
        let mut signals = rx.into_signals().expect("readable");
        tx.send(1).expect("send");
        assert_eq!(signals.recv().await, Some(Signal));
        drop(tx);
        assert_eq!(signals.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn timers() {
        let mut once = after(Duration::from_secs(5));
        assert_eq!(once.recv().await, Some(Signal));
        assert_eq!(once.recv().await, None);

        let start = Instant::now();
        let mut ticks = every(Duration::from_secs(10));
        assert_eq!(ticks.recv().await, Some(Signal));
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(ticks.recv().await, Some(Signal));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_minimum() {
        let start = Instant::now();
        let mut ticks = every(Duration::ZERO);
        assert_eq!(ticks.recv().await, Some(Signal));
        assert!(start.elapsed() >= MIN_PERIOD);
        assert_eq!(ticks.recv().await, Some(Signal));
    }

    #[tokio::test]
    async fn arbitrary_streams_and_futures() {
        let mut signals = from_stream(stream::iter([1, 2, 3]))
            .into_signals()
            .expect("readable");
        assert_eq!(signals.recv().await, Some(Signal));

        let mut signals = on(async { 7 });
        assert_eq!(signals.recv().await, Some(Signal));
        assert_eq!(signals.recv().await, None);
    }

    #[tokio::test]
    async fn forwarder_stops_when_output_dropped() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        let signals = rx.into_signals().expect("readable");
        drop(signals);

        time::timeout(Duration::from_secs(1), tx.closed())
            .await
            .expect("forwarder released the source");
    }
}
