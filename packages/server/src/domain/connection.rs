//! Forced-close capability for a client's underlying connection.

use std::fmt;

/// Why a connection is being closed (maps onto WebSocket close codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Queue drained after unregistration
    Normal,
    /// Peer or server is going away
    GoingAway,
    /// Evicted by the hub because the outbound queue was full
    TooSlow,
}

impl CloseReason {
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::Normal => 1000,
            CloseReason::GoingAway => 1001,
            CloseReason::TooSlow => 1008,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CloseReason::Normal => "disconnected",
            CloseReason::GoingAway => "going away",
            CloseReason::TooSlow => "connection too slow to keep up with messages",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Handle used by the hub to terminate a client's connection
///
/// `close` must not block: the hub calls it from a spawned task, but the
/// connection side is expected to only record the reason and wake up.
pub trait ConnectionCloser: Send + Sync {
    fn close(&self, reason: CloseReason);
}
