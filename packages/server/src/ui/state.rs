//! Shared application state.

use std::sync::Arc;

use parlor_shared::time::Clock;

use crate::{
    domain::Authenticator,
    hub::Hub,
    infrastructure::connection::PumpConfig,
    usecase::{JoinRoomUseCase, ListRoomsUseCase, SuperChatUseCase},
};

/// Shared application state
pub struct AppState {
    /// Hub handle used by connection pumps
    pub hub: Hub,
    pub clock: Arc<dyn Clock>,
    pub pump_config: PumpConfig,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: JoinRoomUseCase,
    /// SuperChatUseCase（スーパーチャット送信のユースケース）
    pub super_chat_usecase: SuperChatUseCase,
    /// ListRoomsUseCase（ルーム一覧取得のユースケース）
    pub list_rooms_usecase: ListRoomsUseCase,
}

impl AppState {
    /// Wire the use cases around one hub.
    ///
    /// # Arguments
    ///
    /// * `queue_capacity` - Outbound queue capacity of each client
    /// * `pump_config` - Per-connection limits; its frame limit also bounds super chats
    pub fn new(
        hub: Hub,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
        queue_capacity: usize,
        pump_config: PumpConfig,
    ) -> Self {
        Self {
            join_room_usecase: JoinRoomUseCase::new(
                hub.clone(),
                Arc::clone(&authenticator),
                queue_capacity,
            ),
            super_chat_usecase: SuperChatUseCase::new(
                hub.clone(),
                authenticator,
                Arc::clone(&clock),
                pump_config.max_frame_bytes,
            ),
            list_rooms_usecase: ListRoomsUseCase::new(hub.clone()),
            hub,
            clock,
            pump_config,
        }
    }
}
