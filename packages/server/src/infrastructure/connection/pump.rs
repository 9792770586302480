//! 受信ループ・送信ループの実装
//!
//! ## 終了シーケンス
//!
//! - 受信ループが終わる（相手の切断、読み込みエラー）と Hub に登録解除を
//!   依頼します。Hub がキューを閉じ、送信ループは残りを送り切ってから
//!   通常切断（1000）でクローズします。
//! - 送信ループが書き込みに失敗すると受信ループを止め、登録解除します。
//! - Hub に追い出された場合は、送信ループが残りを送り切ってから
//!   ポリシー違反（1008）でクローズします。

use std::{fmt, sync::Arc, time::Duration};

use axum::extract::ws::{CloseFrame, Message as WsMessage};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use parlor_shared::time::Clock;

use crate::{
    domain::{ClientId, DisplayName, Identity, Message, Payload, Timestamp},
    hub::{ClientTicket, Hub, OutboundQueue},
    infrastructure::dto::websocket::ChatFrame,
};

use super::closer::CloseWatch;

/// Per-connection I/O limits
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Upper bound for writing one frame (or the close frame)
    pub write_timeout: Duration,
    /// Largest accepted inbound payload
    pub max_frame_bytes: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(10),
            max_frame_bytes: 768,
        }
    }
}

/// How the outbound loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundOutcome {
    /// Queue drained and closed; a close frame with this code was attempted
    Drained { close_code: u16 },
    /// A frame could not be written in time or at all
    WriteFailed,
}

/// Both loops of one registered client
pub struct ConnectionPump {
    hub: Hub,
    ticket: ClientTicket,
    identity: Identity,
    queue: OutboundQueue,
    close: CloseWatch,
    clock: Arc<dyn Clock>,
    config: PumpConfig,
}

impl ConnectionPump {
    pub fn new(
        hub: Hub,
        ticket: ClientTicket,
        identity: Identity,
        queue: OutboundQueue,
        close: CloseWatch,
        clock: Arc<dyn Clock>,
        config: PumpConfig,
    ) -> Self {
        Self {
            hub,
            ticket,
            identity,
            queue,
            close,
            clock,
            config,
        }
    }

    /// Run both loops until the connection is fully torn down.
    ///
    /// Anonymous clients get a receive-only reader that never submits
    /// messages.
    pub async fn run<S, R, E>(self, sink: S, frames: R)
    where
        S: Sink<WsMessage> + Unpin + Send + 'static,
        S::Error: fmt::Display + Send,
        R: Stream<Item = Result<WsMessage, E>> + Unpin + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let Self {
            hub,
            ticket,
            identity,
            queue,
            close,
            clock,
            config,
        } = self;

        let mut send_task = tokio::spawn(outbound_loop(sink, queue, close.clone(), config.clone()));
        let mut recv_task = match identity {
            Identity::Member(sender) => tokio::spawn(inbound_loop(
                frames,
                hub.clone(),
                ticket,
                sender,
                clock,
                close,
                config.max_frame_bytes,
            )),
            Identity::Anonymous => {
                tokio::spawn(receive_only_loop(frames, hub.clone(), ticket, close))
            }
        };

        tokio::select! {
            _ = &mut recv_task => {
                // Unregistered by the reader; let the writer drain and close
                if let Err(e) = send_task.await {
                    tracing::warn!("Outbound loop of client '{}' failed: {}", ticket.id, e);
                }
            }
            _ = &mut send_task => {
                recv_task.abort();
                unregister(&hub, ticket);
            }
        }

        tracing::info!("Connection of client '{}' closed", ticket.id);
    }
}

/// Read frames, turn each into a message, and submit it to the hub.
///
/// Exits on peer close, read failure, forced close, or hub shutdown, then
/// unregisters the client.
pub async fn inbound_loop<R, E>(
    mut frames: R,
    hub: Hub,
    ticket: ClientTicket,
    sender: DisplayName,
    clock: Arc<dyn Clock>,
    mut close: CloseWatch,
    max_frame_bytes: usize,
) where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(bytes) = next_data(&mut frames, &mut close, ticket.id).await {
        let payload = match Payload::bounded(bytes, max_frame_bytes) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("Dropping frame from client '{}': {}", ticket.id, e);
                continue;
            }
        };
        let message = Message::new(
            sender.clone(),
            payload,
            Timestamp::new(clock.now_millis()),
            ticket.room_id,
        );
        if hub.broadcast(message).await.is_err() {
            tracing::warn!("Hub stopped, closing reader of client '{}'", ticket.id);
            break;
        }
    }

    unregister(&hub, ticket);
}

/// Reader for anonymous clients: watches for the peer going away, discards
/// anything it sends.
pub async fn receive_only_loop<R, E>(mut frames: R, hub: Hub, ticket: ClientTicket, mut close: CloseWatch)
where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: fmt::Display,
{
    while next_data(&mut frames, &mut close, ticket.id).await.is_some() {
        tracing::debug!("Ignoring frame from receive-only client '{}'", ticket.id);
    }

    unregister(&hub, ticket);
}

/// Drain the outbound queue into the transport, then close it.
///
/// Every message queued before the hub closed the queue is written first.
pub async fn outbound_loop<S>(
    mut sink: S,
    mut queue: OutboundQueue,
    close: CloseWatch,
    config: PumpConfig,
) -> OutboundOutcome
where
    S: Sink<WsMessage> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(message) = queue.recv().await {
        let frame = match encode_frame(&message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to encode message: {}", e);
                continue;
            }
        };

        match tokio::time::timeout(config.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Failed to write frame: {}", e);
                close_sink(&mut sink, config.write_timeout).await;
                return OutboundOutcome::WriteFailed;
            }
            Err(_) => {
                tracing::warn!("Timed out writing frame after {:?}", config.write_timeout);
                close_sink(&mut sink, config.write_timeout).await;
                return OutboundOutcome::WriteFailed;
            }
        }
    }

    let reason = close.reason();
    let frame = WsMessage::Close(Some(CloseFrame {
        code: reason.code(),
        reason: reason.description().into(),
    }));
    match tokio::time::timeout(config.write_timeout, sink.send(frame)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Failed to send close frame: {}", e),
        Err(_) => tracing::debug!("Timed out sending close frame"),
    }
    close_sink(&mut sink, config.write_timeout).await;

    OutboundOutcome::Drained {
        close_code: reason.code(),
    }
}

/// Next data frame, or `None` once the connection is over for reading.
async fn next_data<R, E>(frames: &mut R, close: &mut CloseWatch, client_id: ClientId) -> Option<Vec<u8>>
where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        let frame = tokio::select! {
            reason = close.requested() => {
                tracing::debug!("Reader of client '{}' stopped: {}", client_id, reason);
                return None;
            }
            frame = frames.next() => frame,
        };

        match frame {
            Some(Ok(WsMessage::Text(text))) => return Some(text.as_str().as_bytes().to_vec()),
            Some(Ok(WsMessage::Binary(bytes))) => return Some(bytes.to_vec()),
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Close(frame))) => {
                match frame {
                    Some(frame) if frame.code != axum::extract::ws::close_code::AWAY => {
                        tracing::info!(
                            "Client '{}' closed the connection ({}: {})",
                            client_id,
                            frame.code,
                            frame.reason
                        );
                    }
                    _ => tracing::debug!("Client '{}' went away", client_id),
                }
                return None;
            }
            Some(Err(e)) => {
                tracing::warn!("Failed to read from client '{}': {}", client_id, e);
                return None;
            }
            None => {
                tracing::debug!("Client '{}' went away", client_id);
                return None;
            }
        }
    }
}

fn encode_frame(message: &Message) -> Result<WsMessage, serde_json::Error> {
    let json = serde_json::to_string(&ChatFrame::from(message))?;
    Ok(WsMessage::Text(json.into()))
}

async fn close_sink<S>(sink: &mut S, timeout: Duration)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: fmt::Display,
{
    if let Ok(Err(e)) = tokio::time::timeout(timeout, sink.close()).await {
        tracing::debug!("Failed to close transport: {}", e);
    }
}

fn unregister(hub: &Hub, ticket: ClientTicket) {
    if hub.unregister(ticket).is_err() {
        tracing::debug!("Hub stopped before client '{}' unregistered", ticket.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CloseReason, ConnectionCloser},
        hub::{
            Client, HubConfig,
            testing::{NoopCloser, member, room, test_client, text_message},
        },
        infrastructure::{
            connection::close_signal,
            history::{InMemoryHistoryStore, RetentionPolicy},
        },
    };
    use futures_util::stream;
    use parlor_shared::time::FixedClock;
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 受信ループ: フレームをメッセージに変換して Hub に渡し、終了時に登録解除する
    // - 送信ループ: キューを送り切ってからクローズフレームを送る
    // - 強制切断時のクローズコード、書き込み失敗時の終了
    // ========================================

    /// Sink that records frames, optionally failing every write
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<WsMessage>,
        fail_writes: bool,
        closed: bool,
    }

    impl Sink<WsMessage> for RecordingSink {
        type Error = io::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: WsMessage) -> Result<(), Self::Error> {
            let this = self.get_mut();
            if this.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
            }
            this.frames.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            self.get_mut().closed = true;
            Poll::Ready(Ok(()))
        }
    }

    impl RecordingSink {
        fn texts(&self) -> Vec<ChatFrame> {
            self.frames
                .iter()
                .filter_map(|frame| match frame {
                    WsMessage::Text(text) => serde_json::from_str(text.as_str()).ok(),
                    _ => None,
                })
                .collect()
        }

        fn close_code(&self) -> Option<u16> {
            self.frames.iter().find_map(|frame| match frame {
                WsMessage::Close(Some(close)) => Some(close.code),
                _ => None,
            })
        }
    }

    fn spawn_hub() -> Hub {
        let (hub, _handle) = Hub::spawn(
            HubConfig::default(),
            Arc::new(InMemoryHistoryStore::new(RetentionPolicy::unbounded())),
            Arc::new(FixedClock::new(0)),
        );
        hub
    }

    fn frames(items: Vec<WsMessage>) -> impl Stream<Item = Result<WsMessage, io::Error>> + Unpin {
        stream::iter(items.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_outbound_loop_drains_then_closes_normally() {
        // テスト項目: キューが閉じられた後も残りのメッセージを送り切り、1000 でクローズする
        // given (前提条件):
        let (client, queue) = test_client("alice", 1, 8);
        for text in ["a", "b"] {
            client.try_enqueue(&Arc::new(text_message("bob", text, 1))).unwrap();
        }
        drop(client);
        let (_closer, close) = close_signal();
        let mut sink = RecordingSink::default();

        // when (操作):
        let outcome = outbound_loop(&mut sink, queue, close, PumpConfig::default()).await;

        // then (期待する結果):
        assert_eq!(outcome, OutboundOutcome::Drained { close_code: 1000 });
        let messages: Vec<String> = sink.texts().into_iter().map(|f| f.message).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(sink.close_code(), Some(1000));
        assert!(sink.closed);
    }

    #[tokio::test]
    async fn test_outbound_loop_uses_policy_violation_after_eviction() {
        // テスト項目: 追い出された場合は残りを送った後 1008 でクローズする
        // given (前提条件):
        let (closer, close) = close_signal();
        let (client, queue) =
            Client::new(member("slow"), room(1), 2, Arc::new(NoopCloser));
        client.try_enqueue(&Arc::new(text_message("bob", "a", 1))).unwrap();
        closer.close(CloseReason::TooSlow);
        drop(client);
        let mut sink = RecordingSink::default();

        // when (操作):
        let outcome = outbound_loop(&mut sink, queue, close, PumpConfig::default()).await;

        // then (期待する結果):
        assert_eq!(outcome, OutboundOutcome::Drained { close_code: 1008 });
        assert_eq!(sink.texts().len(), 1);
        assert_eq!(sink.close_code(), Some(1008));
    }

    #[tokio::test]
    async fn test_outbound_loop_stops_on_write_failure() {
        // テスト項目: 書き込みに失敗すると送信ループは終了する
        // given (前提条件):
        let (client, queue) = test_client("alice", 1, 8);
        client.try_enqueue(&Arc::new(text_message("bob", "a", 1))).unwrap();
        let (_closer, close) = close_signal();
        let mut sink = RecordingSink {
            fail_writes: true,
            ..Default::default()
        };

        // when (操作):
        let outcome = outbound_loop(&mut sink, queue, close, PumpConfig::default()).await;

        // then (期待する結果):
        assert_eq!(outcome, OutboundOutcome::WriteFailed);
        assert!(sink.frames.is_empty());
        drop(client);
    }

    #[tokio::test]
    async fn test_inbound_loop_broadcasts_frames_and_unregisters() {
        // テスト項目: 受信したフレームがブロードキャストされ、切断時に登録解除される
        // given (前提条件):
        let hub = spawn_hub();
        let (listener, mut listener_queue) = test_client("listener", 4, 8);
        let (speaker, _speaker_queue) = test_client("speaker", 4, 8);
        hub.register(listener).unwrap();
        let ticket = hub.register(speaker).unwrap();
        let (_closer, close) = close_signal();
        let input = frames(vec![
            WsMessage::Text("hello".into()),
            WsMessage::Text("".into()),
            WsMessage::Binary(vec![b'x'; 1024].into()),
            WsMessage::Binary(b"bytes".to_vec().into()),
        ]);

        // when (操作):
        inbound_loop(
            input,
            hub.clone(),
            ticket,
            DisplayName::new("speaker".to_string()).unwrap(),
            Arc::new(FixedClock::new(5_000)),
            close,
            16,
        )
        .await;

        // then (期待する結果): 空のフレームと大きすぎるフレームは破棄される
        let first = listener_queue.recv().await.unwrap();
        assert_eq!(first.payload().as_bytes(), b"hello");
        assert_eq!(first.sender().as_str(), "speaker");
        assert_eq!(first.timestamp(), Timestamp::new(5_000));
        assert!(!first.is_super());
        let second = listener_queue.recv().await.unwrap();
        assert_eq!(second.payload().as_bytes(), b"bytes");

        let rooms = hub.rooms().await.unwrap();
        assert_eq!(rooms[0].member_count, 1);
    }

    #[tokio::test]
    async fn test_inbound_loop_stops_when_force_closed() {
        // テスト項目: 強制切断が要求されると受信ループは読み込みをやめる
        // given (前提条件):
        let hub = spawn_hub();
        let (closer, close) = close_signal();
        let (client, _queue) = test_client("alice", 6, 8);
        let ticket = hub.register(client).unwrap();
        closer.close(CloseReason::TooSlow);

        // when (操作): 永遠にフレームが来ないストリームでも終了する
        inbound_loop(
            stream::pending::<Result<WsMessage, io::Error>>(),
            hub.clone(),
            ticket,
            DisplayName::new("alice".to_string()).unwrap(),
            Arc::new(FixedClock::new(0)),
            close,
            768,
        )
        .await;

        // then (期待する結果):
        assert!(hub.rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_receive_only_loop_never_broadcasts() {
        // テスト項目: 匿名クライアントが送ったフレームはブロードキャストされない
        // given (前提条件):
        let hub = spawn_hub();
        let (listener, mut listener_queue) = test_client("listener", 2, 8);
        hub.register(listener).unwrap();
        let (anonymous, _anonymous_queue) =
            Client::new(Identity::Anonymous, room(2), 8, Arc::new(NoopCloser));
        let ticket = hub.register(anonymous).unwrap();
        let (_closer, close) = close_signal();

        // when (操作):
        receive_only_loop(
            frames(vec![WsMessage::Text("let me talk".into())]),
            hub.clone(),
            ticket,
            close,
        )
        .await;
        hub.broadcast(text_message("listener", "only this", 2))
            .await
            .unwrap();

        // then (期待する結果):
        let received = listener_queue.recv().await.unwrap();
        assert_eq!(received.payload().as_bytes(), b"only this");
        assert_eq!(hub.rooms().await.unwrap()[0].member_count, 1);
    }

    #[tokio::test]
    async fn test_pump_tears_down_after_peer_close() {
        // テスト項目: 相手が切断すると登録解除され、届いていたメッセージを送った後 1000 でクローズする
        // given (前提条件):
        let hub = spawn_hub();
        let (closer, close) = close_signal();
        let identity = member("alice");
        let (client, queue) = Client::new(identity.clone(), room(3), 8, Arc::new(closer));
        let ticket = hub.register(client).unwrap();
        hub.broadcast(text_message("bob", "welcome", 3)).await.unwrap();
        // 問い合わせは最後に処理されるので、ここでブロードキャストは配送済み
        hub.rooms().await.unwrap();
        let pump = ConnectionPump::new(
            hub.clone(),
            ticket,
            identity,
            queue,
            close,
            Arc::new(FixedClock::new(0)),
            PumpConfig::default(),
        );
        let (sink, observed) = SharedSink::new();

        // when (操作):
        pump.run(sink, frames(vec![WsMessage::Close(None)])).await;

        // then (期待する結果):
        let frames = observed.lock().unwrap().clone();
        assert_eq!(frames.len(), 2);
        assert!(
            matches!(&frames[0], WsMessage::Text(text) if text.as_str().contains("\"welcome\""))
        );
        assert!(matches!(&frames[1], WsMessage::Close(Some(close)) if close.code == 1000));
        assert!(hub.rooms().await.unwrap().is_empty());
    }

    /// Cloneable view on frames written through a `'static` sink
    struct SharedSink {
        frames: Arc<std::sync::Mutex<Vec<WsMessage>>>,
    }

    impl SharedSink {
        fn new() -> (Self, Arc<std::sync::Mutex<Vec<WsMessage>>>) {
            let frames = Arc::new(std::sync::Mutex::new(Vec::new()));
            (
                Self {
                    frames: Arc::clone(&frames),
                },
                frames,
            )
        }
    }

    impl Sink<WsMessage> for SharedSink {
        type Error = io::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: WsMessage) -> Result<(), Self::Error> {
            self.frames.lock().unwrap().push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }
}
