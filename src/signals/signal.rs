//! # Uniform signal channel.
//!
//! A [`Signal`] is a content-free "proceed" event. [`Signals`] is the receiving
//! half every trigger source is normalized into, [`Outlet`] the sending half.
//!
//! Outlets never block: [`Outlet::try_fire`] either places the signal in the
//! free slot or drops it and reports why.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

pub use tokio::sync::mpsc::error::TryRecvError;

/// Capacity of completion outlets created by [`Task::subscribe`](crate::Task::subscribe).
pub const OUTLET_CAPACITY: usize = 1;

/// Content-free event meaning "proceed".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal;

/// Why a non-blocking fire did not deliver its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dropped {
    /// The receiver already holds as many pending signals as it can buffer.
    Full,
    /// The receiver is gone.
    Closed,
}

impl Dropped {
    /// Short reason string used in events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dropped::Full => "full",
            Dropped::Closed => "closed",
        }
    }
}

/// Creates a bounded signal channel (capacity clamped to 1).
///
/// ## Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use tasktrigger::signals::{self, Dropped, Signal};
///
/// let (outlet, mut signals) = signals::channel(1);
/// assert!(outlet.try_fire().is_ok());
/// assert_eq!(outlet.try_fire(), Err(Dropped::Full));
/// assert_eq!(signals.recv().await, Some(Signal));
/// # }
/// ```
pub fn channel(capacity: usize) -> (Outlet, Signals) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Outlet { tx }, Signals { rx })
}

/// Sending half of a signal channel.
#[derive(Clone, Debug)]
pub struct Outlet {
    tx: mpsc::Sender<Signal>,
}

impl Outlet {
    /// Delivers a signal if a slot is free; drops it otherwise. Never blocks.
    pub fn try_fire(&self) -> Result<(), Dropped> {
        match self.tx.try_send(Signal) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(Dropped::Full),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Dropped::Closed),
        }
    }

    /// Waits for a free slot and delivers a signal.
    ///
    /// Returns `false` if the receiver is gone.
    pub async fn fire(&self) -> bool {
        self.tx.send(Signal).await.is_ok()
    }

    /// Returns `true` once the receiving half was dropped or closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Completes when the receiving half is dropped or closed.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// Receiving half of a signal channel: the uniform trigger type.
///
/// Implements [`Stream`], yielding one [`Signal`] per delivered event and
/// ending once every outlet (or the forwarding task) is gone.
#[derive(Debug)]
pub struct Signals {
    rx: mpsc::Receiver<Signal>,
}

impl Signals {
    /// Waits for the next signal; `None` once the source is exhausted.
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    ///
    /// Returns `Err(TryRecvError::Disconnected)` once the source is exhausted
    /// and every pending signal was consumed.
    pub fn try_recv(&mut self) -> Result<Signal, TryRecvError> {
        self.rx.try_recv()
    }

    /// Returns `true` if every sender is gone (pending signals may remain).
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }

    /// Returns `true` if no signal is pending.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Closes the channel; outlets observe `Dropped::Closed` from now on.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for Signals {
    type Item = Signal;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Signal>> {
        self.rx.poll_recv(cx)
    }
}
