//! UseCase: ルーム一覧取得処理

use crate::{
    domain::RoomSummary,
    hub::{Hub, HubError},
};

/// ルーム一覧取得のユースケース
pub struct ListRoomsUseCase {
    hub: Hub,
}

impl ListRoomsUseCase {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    /// Live rooms sorted by id
    pub async fn execute(&self) -> Result<Vec<RoomSummary>, HubError> {
        self.hub.rooms().await
    }
}
