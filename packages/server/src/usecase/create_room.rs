//! UseCase: ルーム作成

use std::sync::Arc;

use buzzquiz_shared::time::Clock;

use crate::domain::{RoomId, RoomRepository, Timestamp};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 新しい ID でルームを作成する。空の名前・パスワードは省略と同じ扱い
    pub async fn execute(&self, name: Option<String>, password: Option<String>) -> RoomId {
        let created_at = Timestamp::new(self.clock.now_jst_millis());
        self.repository.create_room(name, password, created_at).await
    }
}
