//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{RoomId, RoomRepository, RoomSummary};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomSummary, GetRoomDetailError> {
        self.repository
            .get_room(room_id)
            .await
            .map(|room| room.summary())
            .map_err(|_| GetRoomDetailError::RoomNotFound)
    }
}
