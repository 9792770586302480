//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::{
    domain::{CloseReason, Identity, RoomId},
    infrastructure::connection::{ConnectionPump, close_signal},
    ui::state::AppState,
};

use super::error::ApiError;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room_id: i64,
    /// Absent for anonymous, receive-only viewers
    pub session_token: Option<String>,
}

/// Authenticate, then upgrade and hand the socket to a connection pump.
///
/// Invalid room ids (400) and invalid tokens (401) are rejected before the
/// upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = RoomId::try_from(query.room_id).inspect_err(|e| {
        tracing::warn!("Rejecting connection: {}", e);
    })?;
    let identity = state
        .join_room_usecase
        .identify(query.session_token.as_deref())
        .await
        .inspect_err(|e| {
            tracing::warn!("Rejecting connection to room {}: {}", room_id, e);
        })?;

    Ok(ws
        .max_message_size(state.pump_config.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, room_id, identity)))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, room_id: RoomId, identity: Identity) {
    let (closer, close) = close_signal();
    let joined = match state
        .join_room_usecase
        .execute(identity.clone(), room_id, Arc::new(closer))
    {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!("Failed to join room {}: {}", room_id, e);
            let reason = CloseReason::GoingAway;
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: reason.code(),
                    reason: reason.description().into(),
                })))
                .await;
            return;
        }
    };

    tracing::info!(
        "Client '{}' ({}) connected to room {}",
        joined.ticket.id,
        identity.display_name(),
        room_id
    );

    let (sink, stream) = socket.split();
    ConnectionPump::new(
        state.hub.clone(),
        joined.ticket,
        identity,
        joined.queue,
        close,
        Arc::clone(&state.clock),
        state.pump_config.clone(),
    )
    .run(sink, stream)
    .await;
}
