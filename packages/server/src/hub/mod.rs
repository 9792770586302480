//! Broadcast hub
//!
//! Owns every room and its members. All membership changes and message
//! fan-out go through one control loop; the rest of the crate talks to it
//! through the cloneable [`Hub`] handle.

mod client;
mod control;
mod journal;
mod registry;
#[cfg(test)]
pub(crate) mod testing;

use std::{sync::Arc, time::Duration};

use parlor_shared::time::Clock;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{HistoryStore, Message, RoomSummary};

pub use client::{Client, ClientTicket, OutboundQueue};
use control::{ControlLoop, Intake};
use journal::Journal;

/// Hub tuning
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Pending broadcasts before submitters wait
    pub broadcast_capacity: usize,
    /// Upper bound for fetching history on registration
    pub history_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 1024,
            history_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Hub is not running")]
    Stopped,
}

/// Handle to the hub control loop
#[derive(Clone)]
pub struct Hub {
    register: mpsc::UnboundedSender<Client>,
    unregister: mpsc::UnboundedSender<ClientTicket>,
    broadcast: mpsc::Sender<Message>,
    query: mpsc::Sender<oneshot::Sender<Vec<RoomSummary>>>,
}

impl Hub {
    /// Start the control loop.
    ///
    /// The loop stops once every clone of the returned handle is dropped.
    pub fn spawn(
        config: HubConfig,
        history: Arc<dyn HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> (Self, JoinHandle<()>) {
        let (register, register_rx) = mpsc::unbounded_channel();
        let (unregister, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast, broadcast_rx) = mpsc::channel(config.broadcast_capacity.max(1));
        let (query, query_rx) = mpsc::channel(16);

        let control = ControlLoop::new(Journal::spawn(history), clock, config);
        let intake = Intake {
            register: register_rx,
            unregister: unregister_rx,
            broadcast: broadcast_rx,
            query: query_rx,
        };
        let handle = tokio::spawn(control.run(intake));

        let hub = Self {
            register,
            unregister,
            broadcast,
            query,
        };
        (hub, handle)
    }

    /// Hand a client over to the hub (fire-and-forget).
    ///
    /// The returned ticket is what the connection side uses to unregister.
    pub fn register(&self, client: Client) -> Result<ClientTicket, HubError> {
        let ticket = client.ticket();
        self.register.send(client).map_err(|_| HubError::Stopped)?;
        Ok(ticket)
    }

    /// Remove a client from its room and close its outbound queue.
    ///
    /// Unregistering a client that is not a member is a no-op.
    pub fn unregister(&self, ticket: ClientTicket) -> Result<(), HubError> {
        self.unregister.send(ticket).map_err(|_| HubError::Stopped)
    }

    /// Submit a message for fan-out to its room.
    ///
    /// Waits only while the broadcast intake is full, never on a client.
    pub async fn broadcast(&self, message: Message) -> Result<(), HubError> {
        self.broadcast
            .send(message)
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Snapshot of live rooms
    pub async fn rooms(&self) -> Result<Vec<RoomSummary>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.query.send(reply).await.map_err(|_| HubError::Stopped)?;
        rx.await.map_err(|_| HubError::Stopped)
    }
}
