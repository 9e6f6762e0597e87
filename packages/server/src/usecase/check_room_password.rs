//! UseCase: ルームのパスワード確認

use std::sync::Arc;

use crate::domain::{RoomId, RoomRepository};

use super::error::CheckPasswordError;

/// パスワード確認のユースケース
pub struct CheckRoomPasswordUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl CheckRoomPasswordUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// パスワードのないルームは常に通る
    pub async fn execute(
        &self,
        room_id: &RoomId,
        password: Option<&str>,
    ) -> Result<bool, CheckPasswordError> {
        if !self.repository.exists(room_id).await {
            return Err(CheckPasswordError::RoomNotFound);
        }
        Ok(self.repository.check_password(room_id, password).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use crate::infrastructure::repository::InMemoryRoomRepository;

    #[tokio::test]
    async fn test_check_room_password() {
        // テスト項目: パスワードの一致・不一致・パスワードなし・存在しないルーム
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let locked = repository
            .create_room(None, Some("secret".to_string()), Timestamp::new(1))
            .await;
        let open = repository.create_room(None, None, Timestamp::new(1)).await;
        let usecase = CheckRoomPasswordUseCase::new(repository);

        // when (操作):
        let right = usecase.execute(&locked, Some("secret")).await;
        let wrong = usecase.execute(&locked, Some("nope")).await;
        let none = usecase.execute(&open, None).await;
        let missing = usecase
            .execute(&RoomId::new("missing".to_string()).unwrap(), None)
            .await;

        // then (期待する結果):
        assert_eq!(right, Ok(true));
        assert_eq!(wrong, Ok(false));
        assert_eq!(none, Ok(true));
        assert_eq!(missing, Err(CheckPasswordError::RoomNotFound));
    }
}
