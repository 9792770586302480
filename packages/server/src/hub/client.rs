//! Client handle owned by the hub while the connection is a room member.

use std::{fmt, sync::Arc};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{ClientId, CloseReason, ConnectionCloser, Identity, Message, RoomId};

/// Consumer side of a client's outbound queue
///
/// `recv` keeps yielding already-enqueued messages after the hub drops the
/// producer side, then returns `None`.
pub type OutboundQueue = mpsc::Receiver<Arc<Message>>;

/// What the connection side keeps after handing its [`Client`] to the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientTicket {
    pub id: ClientId,
    pub room_id: RoomId,
}

/// Why a non-blocking enqueue failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnqueueError {
    /// The consumer cannot keep up
    Full,
    /// The consumer is gone
    Closed,
}

/// One connection's membership handle
///
/// The hub holds the only producer of the outbound queue, so dropping the
/// client is what closes the queue. A client moved into the hub can never be
/// registered again.
pub struct Client {
    id: ClientId,
    identity: Identity,
    room_id: RoomId,
    capacity: usize,
    outbound: mpsc::Sender<Arc<Message>>,
    closer: Arc<dyn ConnectionCloser>,
}

impl Client {
    /// Create a client and the consumer side of its bounded outbound queue
    ///
    /// A zero capacity is raised to one.
    pub fn new(
        identity: Identity,
        room_id: RoomId,
        capacity: usize,
        closer: Arc<dyn ConnectionCloser>,
    ) -> (Self, OutboundQueue) {
        Self::with_id(ClientId::generate(), identity, room_id, capacity, closer)
    }

    pub(crate) fn with_id(
        id: ClientId,
        identity: Identity,
        room_id: RoomId,
        capacity: usize,
        closer: Arc<dyn ConnectionCloser>,
    ) -> (Self, OutboundQueue) {
        let capacity = capacity.max(1);
        let (outbound, queue) = mpsc::channel(capacity);
        let client = Self {
            id,
            identity,
            room_id,
            capacity,
            outbound,
            closer,
        };
        (client, queue)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Outbound queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ticket(&self) -> ClientTicket {
        ClientTicket {
            id: self.id,
            room_id: self.room_id,
        }
    }

    pub(crate) fn try_enqueue(&self, message: &Arc<Message>) -> Result<(), EnqueueError> {
        self.outbound
            .try_send(Arc::clone(message))
            .map_err(|e| match e {
                TrySendError::Full(_) => EnqueueError::Full,
                TrySendError::Closed(_) => EnqueueError::Closed,
            })
    }

    pub(crate) fn force_close(&self, reason: CloseReason) {
        self.closer.close(reason);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::testing::{NoopCloser, room, text_message};

    #[tokio::test]
    async fn test_try_enqueue_reports_full_queue() {
        // テスト項目: キューが満杯の場合、ブロックせずに Full が返される
        // given (前提条件):
        let (client, mut queue) =
            Client::new(Identity::Anonymous, room(1), 1, Arc::new(NoopCloser));
        let first = Arc::new(text_message("alice", "a", 1));
        let second = Arc::new(text_message("alice", "b", 1));

        // when (操作):
        let first_result = client.try_enqueue(&first);
        let second_result = client.try_enqueue(&second);

        // then (期待する結果):
        assert_eq!(first_result, Ok(()));
        assert_eq!(second_result, Err(EnqueueError::Full));
        assert_eq!(queue.recv().await, Some(first));
    }

    #[tokio::test]
    async fn test_try_enqueue_reports_closed_queue() {
        // テスト項目: 受信側が破棄されている場合、Closed が返される
        // given (前提条件):
        let (client, queue) = Client::new(Identity::Anonymous, room(1), 4, Arc::new(NoopCloser));
        drop(queue);

        // when (操作):
        let result = client.try_enqueue(&Arc::new(text_message("alice", "a", 1)));

        // then (期待する結果):
        assert_eq!(result, Err(EnqueueError::Closed));
    }

    #[tokio::test]
    async fn test_dropping_client_closes_queue_after_drain() {
        // テスト項目: Client を破棄するとキューは残りのメッセージを返した後に閉じる
        // given (前提条件):
        let (client, mut queue) =
            Client::new(Identity::Anonymous, room(1), 4, Arc::new(NoopCloser));
        let message = Arc::new(text_message("alice", "a", 1));
        client.try_enqueue(&message).unwrap();

        // when (操作):
        drop(client);

        // then (期待する結果):
        assert_eq!(queue.recv().await, Some(message));
        assert_eq!(queue.recv().await, None);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        // テスト項目: 容量 0 を指定しても 1 件は受け付ける
        // given (前提条件):
        let (client, _queue) = Client::new(Identity::Anonymous, room(1), 0, Arc::new(NoopCloser));

        // when (操作):
        let result = client.try_enqueue(&Arc::new(text_message("alice", "a", 1)));

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }
}
