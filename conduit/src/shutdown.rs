use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle of an adapter's wrapped backend. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownState {
    Active,
    Closing,
    Closed,
}

/// Shared shutdown state observed by both the non-blocking trigger and the
/// blocking waiters.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<ShutdownState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ShutdownState::Active);
        Self { tx }
    }

    pub fn state(&self) -> ShutdownState {
        *self.tx.borrow()
    }

    /// Move Active -> Closing. Returns false if a close was already requested.
    pub fn begin_close(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ShutdownState::Active {
                *state = ShutdownState::Closing;
                true
            } else {
                false
            }
        })
    }

    /// Mark the backend as closed.
    pub fn complete(&self) {
        self.tx.send_if_modified(|state| {
            if *state == ShutdownState::Closed {
                false
            } else {
                *state = ShutdownState::Closed;
                true
            }
        });
    }

    /// Resolves once the state reaches Closed.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|state| *state == ShutdownState::Closed).await;
    }

    /// Wait up to `timeout` for Closed. Returns whether it was reached.
    pub async fn wait_closed(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.closed()).await.is_ok()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
