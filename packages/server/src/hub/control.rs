//! Hub control loop
//!
//! The only writer of the room registry. Intake is served one event at a
//! time, registrations first, then unregistrations, then finished history
//! reads, then broadcasts, so a client's own registration is always
//! processed before anything it sends.
//!
//! The loop never waits on the history store. A joining client becomes a
//! member at once; its history read runs on a separate task and the result
//! comes back as one more intake.

use std::sync::Arc;

use parlor_shared::time::Clock;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};

use crate::domain::{ClientId, CloseReason, Message, RoomSummary, Timestamp};

use super::{
    HubConfig,
    client::{Client, ClientTicket},
    journal::Journal,
    registry::{Admission, FanOut, Replay, RoomRegistry},
};

/// Receiving ends of the hub's intake channels
pub(crate) struct Intake {
    pub(crate) register: mpsc::UnboundedReceiver<Client>,
    pub(crate) unregister: mpsc::UnboundedReceiver<ClientTicket>,
    pub(crate) broadcast: mpsc::Receiver<Message>,
    pub(crate) query: mpsc::Receiver<oneshot::Sender<Vec<RoomSummary>>>,
}

/// History fetched for a newly registered client
struct HistoryReply {
    client_id: ClientId,
    history: Vec<Arc<Message>>,
}

pub(crate) struct ControlLoop {
    registry: RoomRegistry,
    journal: Journal,
    history_reads: JoinSet<HistoryReply>,
    clock: Arc<dyn Clock>,
    config: HubConfig,
}

impl ControlLoop {
    pub(crate) fn new(journal: Journal, clock: Arc<dyn Clock>, config: HubConfig) -> Self {
        Self {
            registry: RoomRegistry::new(),
            journal,
            history_reads: JoinSet::new(),
            clock,
            config,
        }
    }

    /// Run until every hub handle is dropped and no history read is pending.
    ///
    /// Dropping the registry on exit closes every remaining outbound queue.
    pub(crate) async fn run(mut self, mut intake: Intake) {
        tracing::info!("Hub control loop started");
        loop {
            tokio::select! {
                biased;
                Some(client) = intake.register.recv() => self.register(client),
                Some(ticket) = intake.unregister.recv() => self.unregister(ticket),
                Some(read) = self.history_reads.join_next(), if !self.history_reads.is_empty() => {
                    match read {
                        Ok(reply) => self.replay(reply),
                        Err(e) => tracing::error!("History read task failed: {}", e),
                    }
                }
                Some(message) = intake.broadcast.recv() => self.broadcast(message),
                Some(reply) = intake.query.recv() => {
                    let _ = reply.send(self.registry.summaries());
                }
                else => break,
            }
        }
        tracing::info!("Hub control loop stopped");
    }

    fn register(&mut self, client: Client) {
        let client_id = client.id();
        let room_id = client.room_id();
        let now = Timestamp::new(self.clock.now_millis());

        match self.registry.admit(client, now) {
            Admission::Admitted => {
                tracing::info!("Client '{}' joined room {}", client_id, room_id);
                // Submitted now so the read sees exactly the earlier appends
                let pending = self.journal.request_recent(room_id);
                let timeout = self.config.history_timeout;
                self.history_reads.spawn(async move {
                    HistoryReply {
                        client_id,
                        history: pending.wait(timeout).await,
                    }
                });
            }
            Admission::AlreadyMember(client) => {
                tracing::warn!("Client '{}' is already registered, ignoring", client.id());
            }
        }
    }

    fn replay(&mut self, reply: HistoryReply) {
        match self.registry.replay(&reply.client_id, &reply.history) {
            Replay::Completed { replayed } => {
                tracing::debug!(
                    "Replayed {} messages to client '{}'",
                    replayed,
                    reply.client_id
                );
            }
            Replay::NotPending => {
                tracing::debug!(
                    "Client '{}' left before its history arrived",
                    reply.client_id
                );
            }
            Replay::TooSlow(client) => {
                tracing::warn!(
                    "Client '{}' could not take the history of room {}",
                    client.id(),
                    client.room_id()
                );
                evict(client);
            }
        }
    }

    fn unregister(&mut self, ticket: ClientTicket) {
        match self.registry.remove(&ticket.id) {
            Some(client) => {
                tracing::info!("Client '{}' left room {}", client.id(), client.room_id());
                if !self.registry.has_room(ticket.room_id) {
                    tracing::info!("Room {} is empty and was discarded", ticket.room_id);
                }
                // Dropping the client closes its outbound queue
                drop(client);
            }
            None => {
                tracing::debug!("Client '{}' is not registered, nothing to do", ticket.id);
            }
        }
    }

    fn broadcast(&mut self, message: Message) {
        let room_id = message.room_id();
        if !self.registry.has_room(room_id) {
            tracing::debug!("Room {} has no members, message dropped", room_id);
            return;
        }

        let message = Arc::new(message);
        self.journal.append(Arc::clone(&message));

        if let FanOut::Delivered { delivered, evicted } = self.registry.fan_out(&message) {
            tracing::debug!(
                "Broadcasted message from '{}' to {} members of room {}",
                message.sender(),
                delivered,
                room_id
            );
            for client in evicted {
                tracing::warn!(
                    "Client '{}' is too slow for room {}, evicting",
                    client.id(),
                    room_id
                );
                evict(client);
            }
        }
    }
}

/// Force-close an unregistered client off the control loop.
///
/// The client (and with it the producer side of its queue) is dropped after
/// the close reason is delivered, so the connection sees the reason before it
/// sees the end of its queue.
fn evict(client: Client) {
    tokio::spawn(async move {
        client.force_close(CloseReason::TooSlow);
        drop(client);
    });
}
