//! UseCase: チャット履歴取得

use std::sync::Arc;

use crate::domain::{ChatMessage, ChatRepository, RoomId, RoomRepository};

use super::error::GetChatHistoryError;

/// `limit` を省略した時の件数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// チャット履歴取得のユースケース
pub struct GetChatHistoryUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
}

impl GetChatHistoryUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        chat_repository: Arc<dyn ChatRepository>,
    ) -> Self {
        Self {
            room_repository,
            chat_repository,
        }
    }

    /// `since` があればそれより新しいメッセージ、なければ直近 `limit` 件
    ///
    /// 存在しないルームについては何も作らずに `RoomNotFound` を返します。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        limit: Option<usize>,
        since: Option<&str>,
    ) -> Result<Vec<ChatMessage>, GetChatHistoryError> {
        if !self.room_repository.exists(room_id).await {
            return Err(GetChatHistoryError::RoomNotFound);
        }
        let messages = match since {
            Some(since) => self.chat_repository.since(room_id, since).await,
            None => {
                self.chat_repository
                    .history(room_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
                    .await
            }
        };
        Ok(messages)
    }
}
