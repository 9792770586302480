//! History journal
//!
//! A single task in front of the [`HistoryStore`] so the control loop never
//! awaits the store. Appends and reads are served in submission order, so a
//! read observes exactly the appends submitted before it.

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, oneshot};

use crate::domain::{HistoryStore, Message, RoomId};

enum JournalCommand {
    Append(Arc<Message>),
    Recent {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<Arc<Message>>>,
    },
}

pub(crate) struct Journal {
    commands: mpsc::UnboundedSender<JournalCommand>,
}

impl Journal {
    /// Spawn the journal task. It stops once the journal is dropped.
    pub(crate) fn spawn(store: Arc<dyn HistoryStore>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, rx));
        Self { commands }
    }

    /// Record a message; failures are logged by the journal task.
    pub(crate) fn append(&self, message: Arc<Message>) {
        if self.commands.send(JournalCommand::Append(message)).is_err() {
            tracing::warn!("History journal stopped, message not recorded");
        }
    }

    /// Submit a history read for a room without waiting for it.
    ///
    /// The read is queued behind every append submitted so far, so it
    /// observes all of them and none submitted later.
    pub(crate) fn request_recent(&self, room_id: RoomId) -> PendingHistory {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(JournalCommand::Recent { room_id, reply })
            .is_err()
        {
            tracing::warn!("History journal stopped, no history for room {}", room_id);
        }
        PendingHistory { room_id, rx }
    }
}

/// A submitted history read
pub(crate) struct PendingHistory {
    room_id: RoomId,
    rx: oneshot::Receiver<Vec<Arc<Message>>>,
}

impl PendingHistory {
    /// Recent history of the room, oldest first.
    ///
    /// Store errors and timeouts both yield an empty history.
    pub(crate) async fn wait(self, timeout: Duration) -> Vec<Arc<Message>> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(messages)) => messages,
            Ok(Err(_)) => Vec::new(),
            Err(_) => {
                tracing::warn!(
                    "Timed out after {:?} fetching history for room {}",
                    timeout,
                    self.room_id
                );
                Vec::new()
            }
        }
    }
}

async fn run(store: Arc<dyn HistoryStore>, mut rx: mpsc::UnboundedReceiver<JournalCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            JournalCommand::Append(message) => {
                let room_id = message.room_id();
                if let Err(e) = store.append(room_id, message).await {
                    tracing::warn!("Failed to append message to room {} history: {}", room_id, e);
                }
            }
            JournalCommand::Recent { room_id, reply } => {
                let messages = store.recent(room_id).await.unwrap_or_else(|e| {
                    tracing::warn!("Failed to fetch history for room {}: {}", room_id, e);
                    Vec::new()
                });
                // The requester may have timed out already
                let _ = reply.send(messages);
            }
        }
    }
    tracing::debug!("History journal stopped");
}
