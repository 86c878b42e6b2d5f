//! Click event model and non-blocking dispatch handle.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

/// A resolved redirect waiting to be counted.
///
/// Created by the resolve path and consumed by
/// [`crate::domain::click_worker::run_click_worker`].
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub short_code: String,
    pub occurred_at: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(short_code: impl Into<String>) -> Self {
        Self {
            short_code: short_code.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Sending half of the click queue.
///
/// [`ClickDispatcher::dispatch`] never blocks and returns nothing to await:
/// the redirect answers immediately and the increment happens later.
#[derive(Clone)]
pub struct ClickDispatcher {
    tx: mpsc::Sender<ClickEvent>,
}

impl ClickDispatcher {
    pub fn new(tx: mpsc::Sender<ClickEvent>) -> Self {
        Self { tx }
    }

    /// Creates a dispatcher together with the receiver the worker drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Queues a click for `short_code` without waiting for it to be stored.
    ///
    /// When the queue is full the event is handed to a detached task that
    /// waits for room, so bursts delay counting instead of dropping clicks.
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, short_code: &str) {
        match self.tx.try_send(ClickEvent::new(short_code)) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(short_code = %event.short_code, "Click queue full, deferring event");
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = tx.send(event).await {
                        error!(short_code = %e.0.short_code, "Click queue closed, event lost");
                    }
                });
            }
            Err(TrySendError::Closed(event)) => {
                error!(short_code = %event.short_code, "Click queue closed, event lost");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots currently left in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}
