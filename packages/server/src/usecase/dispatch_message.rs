//! UseCase: 受信メッセージのデコードと振り分け
//!
//! 1 つの接続から届いたフレームを 1 つずつ処理します（接続ごとの制御ループから呼ばれる）。
//! デコードできないフレームや未知の種類のメッセージで接続を切ることはありません。

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{ConnectionRegistry, RepositoryError, RoomRepository},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage, non_json_echo, unknown_kind_echo},
};

use super::{
    SessionContext, game_control::GameControlUseCase, outbound::send_to,
    send_chat_message::SendChatMessageUseCase,
};

/// 受信メッセージ振り分けのユースケース
pub struct DispatchMessageUseCase {
    room_repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    send_chat_message: Arc<SendChatMessageUseCase>,
    game_control: Arc<GameControlUseCase>,
}

impl DispatchMessageUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        send_chat_message: Arc<SendChatMessageUseCase>,
        game_control: Arc<GameControlUseCase>,
    ) -> Self {
        Self {
            room_repository,
            registry,
            send_chat_message,
            game_control,
        }
    }

    pub async fn execute(&self, session: &SessionContext, frame: &str) {
        let value: Value = match serde_json::from_str(frame) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Non-JSON frame from '{}': {}", session.client_id, e);
                self.registry
                    .send(&session.client_id, &non_json_echo(frame))
                    .await;
                return;
            }
        };
        let message: ClientMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Unrecognized message from '{}': {}", session.client_id, e);
                self.registry
                    .send(&session.client_id, &unknown_kind_echo(frame))
                    .await;
                return;
            }
        };

        if let Err(e) = self.apply(session, message).await {
            tracing::warn!(
                "Failed to handle message from '{}' in room '{}': {}",
                session.client_id,
                session.room_id,
                e
            );
        }
    }

    async fn apply(
        &self,
        session: &SessionContext,
        message: ClientMessage,
    ) -> Result<(), RepositoryError> {
        match message {
            ClientMessage::ChatMessage { content } => {
                self.send_chat_message.execute(session, &content).await;
            }
            ClientMessage::GetPlayerList => {
                let players = self.room_repository.player_list(&session.room_id).await?;
                send_to(
                    self.registry.as_ref(),
                    &session.client_id,
                    &ServerMessage::PlayerList {
                        players: players.into(),
                    },
                )
                .await;
            }
            ClientMessage::ConfigUpdate { config } => {
                self.game_control.update_config(session, config).await?;
            }
            ClientMessage::Buzz => {
                self.game_control.buzz(session).await?;
            }
            ClientMessage::StartGame => {
                self.game_control.start_game(session).await?;
            }
            ClientMessage::PauseGame => {
                self.game_control.pause_game(session).await?;
            }
            ClientMessage::EndGame => {
                self.game_control.end_game(session).await?;
            }
            ClientMessage::ValidateAnswer { is_correct } => {
                self.game_control
                    .validate_answer(session, is_correct)
                    .await?;
            }
            ClientMessage::SongUpdate { song } => {
                self.game_control.update_song(session, song).await?;
            }
        }
        Ok(())
    }
}
