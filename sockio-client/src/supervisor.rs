//! Reconnection supervisor
//!
//! One background task per client, started at build time when the policy is
//! enabled. It waits for a disconnect signal, then sleeps and redials until
//! a dial succeeds, then waits for the next signal:
//!
//! ```text
//! wait signal ──► sleep(delay) ──► dial ──ok──► wait signal
//!      │                ▲            │
//!   closed              └────err─────┘ (on_error)
//!      ▼
//!    exit
//! ```
//!
//! The signal path is a [`ReconnectNotifier`]: a single-slot queue whose
//! sender can be withdrawn. Once the client is closed the sender is gone,
//! late disconnect notifications are dropped, and the supervisor exits.

use crate::client::ClientInner;
use sockio_core::Error;
use std::sync::{Mutex, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Closable, single-slot reconnect signal
pub(crate) struct ReconnectNotifier {
    slot: Mutex<Option<mpsc::Sender<()>>>,
}

impl ReconnectNotifier {
    /// Create a notifier and the receiving end for the supervisor
    pub(crate) fn new() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                slot: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Signal a disconnect
    ///
    /// A signal that is already pending absorbs this one. Returns false
    /// after [`shutdown`](Self::shutdown).
    pub(crate) fn notify(&self) -> bool {
        let Ok(slot) = self.slot.lock() else {
            return false;
        };
        match slot.as_ref() {
            Some(tx) => match tx.try_send(()) {
                Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
                Err(mpsc::error::TrySendError::Closed(())) => false,
            },
            None => false,
        }
    }

    /// Withdraw the sender. Idempotent.
    pub(crate) fn shutdown(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }

    /// Whether signals are still accepted
    pub(crate) fn is_active(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// Start the supervisor for a client
///
/// The task only holds a weak reference, so dropping every client handle
/// also ends it.
pub(crate) fn spawn(client: Weak<ClientInner>, signals: mpsc::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(run(client, signals))
}

async fn run(client: Weak<ClientInner>, mut signals: mpsc::Receiver<()>) {
    while signals.recv().await.is_some() {
        if !reconnect(&client).await {
            break;
        }
    }
    tracing::debug!("Reconnection supervisor stopped");
}

/// Redial until success. Returns false when the supervisor should exit.
async fn reconnect(client: &Weak<ClientInner>) -> bool {
    let mut attempt: u32 = 0;
    loop {
        let Some(delay) = client.upgrade().map(|c| c.policy().effective_delay()) else {
            return false;
        };
        tokio::time::sleep(delay).await;

        let Some(inner) = client.upgrade() else {
            return false;
        };
        attempt = attempt.saturating_add(1);
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

        match inner.redial(attempt).await {
            Ok(()) => {
                tracing::info!(attempt, "Reconnected successfully");
                return true;
            }
            // The caller dialed on their own while we slept
            Err(Error::AlreadyConnected) => return true,
            Err(Error::ClientClosed) => return false,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Reconnection failed");
                inner.policy().report(&e);
            }
        }
    }
}
