//! UseCase: チャットメッセージ送信処理
//!
//! 送信者には `is_self` 付きのエコーを返し、ルームの他のメンバーにはそのまま配信します。

use std::sync::Arc;

use buzzquiz_shared::time::Clock;

use crate::{
    domain::{ChatMessage, ChatRepository, ConnectionRegistry, RoomRepository, Timestamp},
    infrastructure::dto::websocket::{ChatMessageDto, ServerMessage},
};

use super::{
    SessionContext,
    outbound::{broadcast, send_to},
};

/// チャットメッセージ送信のユースケース
pub struct SendChatMessageUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl SendChatMessageUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        chat_repository: Arc<dyn ChatRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_repository,
            chat_repository,
            registry,
            clock,
        }
    }

    pub async fn execute(&self, session: &SessionContext, content: &str) -> ChatMessage {
        let sender_name = self
            .room_repository
            .display_name(&session.room_id, &session.client_id)
            .await
            .unwrap_or_else(|_| session.client_id.as_str().to_string());
        let at = Timestamp::new(self.clock.now_jst_millis());
        let message = self
            .chat_repository
            .append(
                &session.room_id,
                &session.client_id,
                &sender_name,
                content,
                session.role,
                at,
            )
            .await;
        tracing::debug!(
            "Chat message from '{}' in room '{}'",
            session.client_id,
            session.room_id
        );

        let dto: ChatMessageDto = message.clone().into();
        send_to(
            self.registry.as_ref(),
            &session.client_id,
            &ServerMessage::ChatMessage {
                message: dto.clone().into_self_echo(),
            },
        )
        .await;
        broadcast(
            self.registry.as_ref(),
            &session.room_id,
            &ServerMessage::ChatMessage { message: dto },
            Some(&session.client_id),
        )
        .await;

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, SenderRole};
    use crate::usecase::test_support::{Fixture, drain};

    #[tokio::test]
    async fn test_chat_message_is_echoed_and_broadcast() {
        // テスト項目: 送信者には is_self 付きのエコー、他のメンバーには通常のメッセージが届く
        // given (前提条件):
        let fixture = Fixture::new();
        let (alice, mut alice_rx) = fixture.join_named("r1", "alice", "Alice", Role::Player).await;
        let (_bob, mut bob_rx) = fixture.join("r1", "bob", Role::Player).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let stored = fixture.chat_usecase().execute(&alice, "hello").await;

        // then (期待する結果):
        assert_eq!(stored.sender_name, "Alice");
        assert_eq!(stored.sender_role, SenderRole::Player);
        let echo = drain(&mut alice_rx);
        assert_eq!(echo.len(), 1);
        assert_eq!(echo[0]["type"], "chat_message");
        assert_eq!(echo[0]["message"]["is_self"], true);
        let others = drain(&mut bob_rx);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0]["message"]["content"], "hello");
        assert!(others[0]["message"].get("is_self").is_none());
    }

    #[tokio::test]
    async fn test_chat_message_is_stored_in_history() {
        // テスト項目: 送信したメッセージが履歴に残る
        // given (前提条件):
        let fixture = Fixture::new();
        let (alice, _rx) = fixture.join("r1", "alice", Role::Spectator).await;

        // when (操作):
        fixture.chat_usecase().execute(&alice, "watching").await;

        // then (期待する結果):
        let history = fixture.chats.history(&alice.room_id, 10).await;
        let last = history.last().unwrap();
        assert_eq!(last.content, "watching");
        assert_eq!(last.sender_role, SenderRole::Spectator);
    }
}
