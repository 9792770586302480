//! InMemory History Store 実装
//!
//! ドメイン層が定義する HistoryStore trait の具体的な実装。
//! ルームごとに VecDeque を持ち、保持ポリシーに従って古いものから捨てます。

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parlor_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{HistoryError, HistoryStore, Message, RoomId};

/// How much history each room keeps
///
/// Both limits apply when both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep at most this many messages per room
    pub max_messages: Option<usize>,
    /// Drop messages older than this
    pub ttl: Option<Duration>,
}

impl RetentionPolicy {
    pub fn new(max_messages: Option<usize>, ttl: Option<Duration>) -> Self {
        Self { max_messages, ttl }
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Some(100), Some(Duration::from_secs(24 * 60 * 60)))
    }
}

/// インメモリ History Store 実装
pub struct InMemoryHistoryStore {
    rooms: Mutex<HashMap<RoomId, VecDeque<Arc<Message>>>>,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl InMemoryHistoryStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RetentionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    /// Drop expired messages, then the oldest ones beyond the count limit.
    fn trim(&self, messages: &mut VecDeque<Arc<Message>>) {
        if let Some(ttl) = self.policy.ttl {
            let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            let cutoff = self.clock.now_millis().saturating_sub(ttl_millis);
            while messages
                .front()
                .is_some_and(|oldest| oldest.timestamp().value() < cutoff)
            {
                messages.pop_front();
            }
        }

        if let Some(max_messages) = self.policy.max_messages {
            while messages.len() > max_messages {
                messages.pop_front();
            }
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, room_id: RoomId, message: Arc<Message>) -> Result<(), HistoryError> {
        let mut rooms = self.rooms.lock().await;
        let messages = rooms.entry(room_id).or_default();
        messages.push_back(message);
        self.trim(messages);
        if messages.is_empty() {
            rooms.remove(&room_id);
        }
        Ok(())
    }

    async fn recent(&self, room_id: RoomId) -> Result<Vec<Arc<Message>>, HistoryError> {
        let mut rooms = self.rooms.lock().await;
        let Some(messages) = rooms.get_mut(&room_id) else {
            return Ok(Vec::new());
        };
        self.trim(messages);
        let recent: Vec<Arc<Message>> = messages.iter().cloned().collect();
        if recent.is_empty() {
            rooms.remove(&room_id);
        }
        Ok(recent)
    }
}
