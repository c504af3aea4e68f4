//! Cancellable scheduled delays, tied to an owning session.
//!
//! A [`TimerSet`] schedules events to fire after a delay and delivers
//! them through [`TimerSet::fired`], which a session selects on
//! alongside its other event sources. Cancelling an id guarantees the
//! event is never delivered, even if the sleep already elapsed.
//! Dropping the set aborts every pending timer.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// A set of pending delays owned by one session.
pub struct TimerSet<E> {
    next_id: u64,
    pending: HashMap<TimerId, JoinHandle<()>>,
    tx: mpsc::UnboundedSender<(TimerId, E)>,
    rx: mpsc::UnboundedReceiver<(TimerId, E)>,
}

impl<E: Send + 'static> TimerSet<E> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            next_id: 0,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Schedules `event` to fire after `delay`.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the set was dropped.
            let _ = tx.send((id, event));
        });
        self.pending.insert(id, handle);
        tracing::trace!(%id, ?delay, "timer scheduled");
        id
    }

    /// Cancels a pending timer. Returns `true` if it had not fired.
    /// A cancelled timer's event is never delivered, even if its
    /// sleep elapsed before the cancel was processed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.remove(&id) {
            Some(handle) => {
                handle.abort();
                tracing::trace!(%id, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    /// Number of timers scheduled but not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for the next timer to fire. Pends forever while nothing
    /// is scheduled, which makes it safe to select on unconditionally.
    pub async fn fired(&mut self) -> (TimerId, E) {
        loop {
            let (id, event) = match self.rx.recv().await {
                Some(fired) => fired,
                // Unreachable while self holds a sender.
                None => std::future::pending().await,
            };
            // An event queued before its timer was cancelled is
            // discarded here.
            if self.pending.remove(&id).is_some() {
                return (id, event);
            }
        }
    }
}

impl<E: Send + 'static> Default for TimerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for TimerSet<E> {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
