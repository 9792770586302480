//! Room registry
//!
//! Hub のコントロールループだけが所有・変更する状態です。
//! ルームはメンバーが 1 人以上いる間だけ存在します。
//!
//! 参加直後のメンバーは履歴の到着待ちです。その間に届いたメッセージは
//! バックログに溜め、履歴のリプレイ後にキューへ流します。

use std::{collections::HashMap, sync::Arc};

use crate::domain::{ClientId, Message, RoomId, RoomSummary, Timestamp};

use super::client::{Client, EnqueueError};

/// A room member, possibly still waiting for its history
struct Member {
    client: Client,
    /// Live messages held back while the history read is in flight
    backlog: Option<Vec<Arc<Message>>>,
}

impl Member {
    fn awaiting_history(client: Client) -> Self {
        Self {
            client,
            backlog: Some(Vec::new()),
        }
    }

    /// Enqueue, or hold back until the history has been replayed.
    ///
    /// The backlog is bounded by the queue capacity.
    fn deliver(&mut self, message: &Arc<Message>) -> Result<(), EnqueueError> {
        match &mut self.backlog {
            Some(backlog) if backlog.len() >= self.client.capacity() => Err(EnqueueError::Full),
            Some(backlog) => {
                backlog.push(Arc::clone(message));
                Ok(())
            }
            None => self.client.try_enqueue(message),
        }
    }

    /// Move held-back messages into the queue, skipping the history.
    fn flush_backlog(&mut self) {
        for message in self.backlog.take().unwrap_or_default() {
            if let Err(e) = self.client.try_enqueue(&message) {
                tracing::debug!("Client '{}' dropped backlog: {:?}", self.client.id(), e);
                break;
            }
        }
    }
}

/// A live room and its members (keyed by client identity)
struct Room {
    created_at: Timestamp,
    members: HashMap<ClientId, Member>,
}

impl Room {
    fn new(created_at: Timestamp) -> Self {
        Self {
            created_at,
            members: HashMap::new(),
        }
    }
}

/// Result of admitting a client into its room
#[derive(Debug)]
pub(crate) enum Admission {
    /// The client is now a member awaiting its history
    Admitted,
    /// A client with the same identity is already a member; the duplicate is
    /// handed back untouched
    AlreadyMember(Client),
}

/// Result of replaying history to a member
#[derive(Debug)]
pub(crate) enum Replay {
    /// History, then the backlog, are queued
    Completed { replayed: usize },
    /// The client left (or was evicted) before its history arrived
    NotPending,
    /// History plus backlog overflowed the outbound queue; the client was
    /// removed
    TooSlow(Client),
}

/// Result of fanning one message out to a room
#[derive(Debug)]
pub(crate) enum FanOut {
    /// No live room with that id; the message is dropped
    NoRoom,
    Delivered {
        delivered: usize,
        /// Members removed because they could not accept the message
        evicted: Vec<Client>,
    },
}

#[derive(Default)]
pub(crate) struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    memberships: HashMap<ClientId, RoomId>,
}

impl RoomRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_member(&self, client_id: &ClientId) -> bool {
        self.memberships.contains_key(client_id)
    }

    pub(crate) fn has_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Add the client to its room, creating the room if absent.
    ///
    /// The member receives nothing until [`replay`](Self::replay) is called
    /// with its history; messages fanned out meanwhile are held back.
    pub(crate) fn admit(&mut self, client: Client, now: Timestamp) -> Admission {
        if self.is_member(&client.id()) {
            return Admission::AlreadyMember(client);
        }

        let room_id = client.room_id();
        self.memberships.insert(client.id(), room_id);
        self.rooms
            .entry(room_id)
            .or_insert_with(|| Room::new(now))
            .members
            .insert(client.id(), Member::awaiting_history(client));

        Admission::Admitted
    }

    /// Queue `history` (oldest first), then the held-back messages.
    pub(crate) fn replay(&mut self, client_id: &ClientId, history: &[Arc<Message>]) -> Replay {
        let Some(member) = self.member_mut(client_id) else {
            return Replay::NotPending;
        };
        let Some(backlog) = member.backlog.take() else {
            return Replay::NotPending;
        };

        let overflowed = history
            .iter()
            .chain(&backlog)
            .any(|message| member.client.try_enqueue(message).is_err());
        if overflowed {
            return match self.remove(client_id) {
                Some(client) => Replay::TooSlow(client),
                None => Replay::NotPending,
            };
        }

        Replay::Completed {
            replayed: history.len(),
        }
    }

    /// Remove a member and discard its room once empty.
    ///
    /// Held-back messages are queued first so they drain before the queue
    /// closes. Returns `None` if the client is not a member (idempotent).
    pub(crate) fn remove(&mut self, client_id: &ClientId) -> Option<Client> {
        let room_id = self.memberships.remove(client_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let member = room.members.remove(client_id);
        if room.members.is_empty() {
            self.rooms.remove(&room_id);
        }

        let mut member = member?;
        member.flush_backlog();
        Some(member.client)
    }

    /// Try to deliver `message` to every member of its room.
    ///
    /// Never blocks: members whose queue (or backlog) rejects the message are
    /// removed and returned for forced close.
    pub(crate) fn fan_out(&mut self, message: &Arc<Message>) -> FanOut {
        let Some(room) = self.rooms.get_mut(&message.room_id()) else {
            return FanOut::NoRoom;
        };

        let mut delivered = 0;
        let mut rejected = Vec::new();
        for (client_id, member) in &mut room.members {
            match member.deliver(message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!("Client '{}' rejected message: {:?}", client_id, e);
                    rejected.push(*client_id);
                }
            }
        }

        let evicted = rejected
            .iter()
            .filter_map(|client_id| self.remove(client_id))
            .collect();

        FanOut::Delivered { delivered, evicted }
    }

    /// Snapshot of all live rooms (sorted by room id)
    pub(crate) fn summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|(id, room)| RoomSummary {
                id: *id,
                member_count: room.members.len(),
                created_at: room.created_at,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.id);
        summaries
    }

    fn member_mut(&mut self, client_id: &ClientId) -> Option<&mut Member> {
        let room_id = self.memberships.get(client_id)?;
        self.rooms.get_mut(room_id)?.members.get_mut(client_id)
    }

    #[cfg(test)]
    fn member_ids(&self, room_id: RoomId) -> Vec<ClientId> {
        self.rooms
            .get(&room_id)
            .map(|room| room.members.keys().copied().collect())
            .unwrap_or_default()
    }
}
