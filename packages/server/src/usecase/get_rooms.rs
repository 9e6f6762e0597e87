//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{RoomRepository, RoomSummary};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 作成日時順のルーム概要
    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.repository.list_summaries().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use crate::infrastructure::repository::InMemoryRoomRepository;

    #[tokio::test]
    async fn test_get_rooms_lists_summaries() {
        // テスト項目: 作成したルームが作成日時順に一覧に含まれる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let second = repository
            .create_room(Some("Second".to_string()), None, Timestamp::new(20))
            .await;
        let first = repository
            .create_room(Some("First".to_string()), Some("pw".to_string()), Timestamp::new(10))
            .await;
        let usecase = GetRoomsUseCase::new(repository);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, first);
        assert!(rooms[0].has_password);
        assert_eq!(rooms[1].id, second);
        assert_eq!(rooms[1].player_count, 0);
    }
}
