//! Test helpers for hub tests.

use std::sync::{Arc, Mutex};

use crate::domain::{
    CloseReason, ConnectionCloser, DisplayName, Identity, Message, Payload, RoomId, Timestamp,
};

use super::client::{Client, OutboundQueue};

/// Closer that ignores close requests
pub(crate) struct NoopCloser;

impl ConnectionCloser for NoopCloser {
    fn close(&self, _reason: CloseReason) {}
}

/// Closer that records every close request
#[derive(Default)]
pub(crate) struct RecordingCloser {
    reasons: Mutex<Vec<CloseReason>>,
}

impl RecordingCloser {
    pub(crate) fn reasons(&self) -> Vec<CloseReason> {
        self.reasons.lock().unwrap().clone()
    }
}

impl ConnectionCloser for RecordingCloser {
    fn close(&self, reason: CloseReason) {
        self.reasons.lock().unwrap().push(reason);
    }
}

pub(crate) fn room(id: i64) -> RoomId {
    RoomId::new(id).unwrap()
}

pub(crate) fn member(name: &str) -> Identity {
    Identity::Member(DisplayName::new(name.to_string()).unwrap())
}

pub(crate) fn text_message(sender: &str, text: &str, room_id: i64) -> Message {
    Message::new(
        DisplayName::new(sender.to_string()).unwrap(),
        Payload::new(text).unwrap(),
        Timestamp::new(1_000),
        room(room_id),
    )
}

/// Member client with a no-op closer
pub(crate) fn test_client(name: &str, room_id: i64, capacity: usize) -> (Client, OutboundQueue) {
    Client::new(member(name), room(room_id), capacity, Arc::new(NoopCloser))
}

/// Drain everything currently queued without waiting
pub(crate) fn drain_text(queue: &mut OutboundQueue) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(message) = queue.try_recv() {
        texts.push(message.payload().to_text_lossy().into_owned());
    }
    texts
}
