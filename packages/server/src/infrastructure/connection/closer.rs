//! Forced-close signal between the hub and a connection's loops.

use tokio::sync::watch;

use crate::domain::{CloseReason, ConnectionCloser};

/// Hub side: records the reason a connection must be closed
#[derive(Debug)]
pub struct WebSocketCloser {
    reason: watch::Sender<Option<CloseReason>>,
}

/// Connection side: observed by both loops
#[derive(Debug, Clone)]
pub struct CloseWatch {
    reason: watch::Receiver<Option<CloseReason>>,
}

/// Create a connected closer / watch pair
pub fn close_signal() -> (WebSocketCloser, CloseWatch) {
    let (tx, rx) = watch::channel(None);
    (WebSocketCloser { reason: tx }, CloseWatch { reason: rx })
}

impl ConnectionCloser for WebSocketCloser {
    fn close(&self, reason: CloseReason) {
        // send_replace stores the value even when no loop is listening yet
        self.reason.send_replace(Some(reason));
    }
}

impl CloseWatch {
    /// Close reason to report to the peer: the forced one if any, otherwise
    /// a normal closure.
    pub fn reason(&self) -> CloseReason {
        self.reason.borrow().unwrap_or(CloseReason::Normal)
    }

    /// Resolve once a forced close has been requested.
    ///
    /// Never resolves if the closer is dropped without requesting one.
    pub async fn requested(&mut self) -> CloseReason {
        loop {
            if let Some(reason) = *self.reason.borrow_and_update() {
                return reason;
            }
            if self.reason.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
