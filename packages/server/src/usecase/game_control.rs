//! UseCase: ゲーム進行（バズ・ホスト操作）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - バズの受理と拒否、ゲームの開始・一時停止・終了、回答判定、設定変更、曲の更新
//! - ホスト操作の権限チェック
//!
//! ### なぜこのテストが必要か
//! - 状態が変わった時だけシステムメッセージとブロードキャストが出ることを保証
//! - 拒否されたバズや回答判定は誰にも通知されない
//!
//! ### どのような状況を想定しているか
//! - 正常系：開始 → バズ → 正解判定
//! - 異常系：2 人目のバズ、バズなしの回答判定、ホスト以外からのホスト操作

use std::sync::Arc;

use buzzquiz_shared::time::{Clock, timestamp_to_jst_rfc3339};
use serde_json::{Map, Value};

use crate::{
    domain::{
        ChatMessage, ChatRepository, ConnectionRegistry, RepositoryError, RoomRepository,
        RoomSnapshot, Timestamp,
    },
    infrastructure::dto::websocket::{ChatMessageDto, RoomStateDto, ServerMessage},
};

use super::{SessionContext, outbound::broadcast};

/// ゲーム進行のユースケース
///
/// 各メソッドは状態が変わってブロードキャストした場合に `Ok(true)` を返します。
/// 条件を満たさない操作は何も送らずに `Ok(false)` を返します。
pub struct GameControlUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl GameControlUseCase {
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

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_jst_millis())
    }

    async fn system_message(&self, session: &SessionContext, content: &str) -> ChatMessage {
        self.chat_repository
            .append_system(&session.room_id, content, self.now())
            .await
    }

    async fn publish(&self, session: &SessionContext, message: ServerMessage) {
        broadcast(self.registry.as_ref(), &session.room_id, &message, None).await;
    }

    /// ホスト操作の結果を受け取り、権限がなかった場合はログを残して `None` にする
    fn host_only<T>(
        &self,
        session: &SessionContext,
        command: &str,
        result: Result<T, RepositoryError>,
    ) -> Result<Option<T>, RepositoryError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(RepositoryError::NotHost(_)) => {
                tracing::warn!(
                    "Ignored {} from non-host client '{}' in room '{}'",
                    command,
                    session.client_id,
                    session.room_id
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// バズ。最初に受理されたバズだけがブロードキャストされる
    pub async fn buzz(&self, session: &SessionContext) -> Result<bool, RepositoryError> {
        let at = self.now();
        let accepted = self
            .room_repository
            .register_buzz(&session.room_id, &session.client_id, at)
            .await?;
        if !accepted {
            tracing::debug!("Buzz from '{}' rejected", session.client_id);
            return Ok(false);
        }
        let name = self
            .room_repository
            .display_name(&session.room_id, &session.client_id)
            .await?;
        let system_message = self.system_message(session, &format!("{name} buzzed!")).await;
        self.publish(
            session,
            ServerMessage::Buzz {
                player: session.client_id.as_str().to_string(),
                timestamp: timestamp_to_jst_rfc3339(at.value()),
                system_message: system_message.into(),
            },
        )
        .await;
        Ok(true)
    }

    pub async fn start_game(&self, session: &SessionContext) -> Result<bool, RepositoryError> {
        let result = self
            .room_repository
            .start_game(&session.room_id, &session.client_id)
            .await;
        let Some(snapshot) = self.host_only(session, "start_game", result)? else {
            return Ok(false);
        };
        let (state, system_message) = self
            .state_with_message(session, snapshot, "The game has started!")
            .await;
        self.publish(
            session,
            ServerMessage::GameStarted {
                state,
                system_message,
            },
        )
        .await;
        Ok(true)
    }

    pub async fn pause_game(&self, session: &SessionContext) -> Result<bool, RepositoryError> {
        let result = self
            .room_repository
            .pause_game(&session.room_id, &session.client_id)
            .await;
        let Some(snapshot) = self.host_only(session, "pause_game", result)? else {
            return Ok(false);
        };
        let (state, system_message) = self
            .state_with_message(session, snapshot, "The game is paused")
            .await;
        self.publish(
            session,
            ServerMessage::GamePaused {
                state,
                system_message,
            },
        )
        .await;
        Ok(true)
    }

    pub async fn end_game(&self, session: &SessionContext) -> Result<bool, RepositoryError> {
        let result = self
            .room_repository
            .end_game(&session.room_id, &session.client_id)
            .await;
        let Some(snapshot) = self.host_only(session, "end_game", result)? else {
            return Ok(false);
        };
        let (state, system_message) = self
            .state_with_message(session, snapshot, "The game has ended!")
            .await;
        self.publish(
            session,
            ServerMessage::GameEnded {
                state,
                system_message,
            },
        )
        .await;
        Ok(true)
    }

    /// 回答判定。バズがなければ何も送らない
    pub async fn validate_answer(
        &self,
        session: &SessionContext,
        is_correct: bool,
    ) -> Result<bool, RepositoryError> {
        let outcome = self
            .room_repository
            .validate_answer(&session.room_id, &session.client_id, is_correct)
            .await;
        let Some(outcome) = self.host_only(session, "validate_answer", outcome)? else {
            return Ok(false);
        };
        let Some((result, snapshot)) = outcome else {
            tracing::debug!("validate_answer without a buzz in room '{}'", session.room_id);
            return Ok(false);
        };
        let name = result
            .scores
            .get(&result.player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| result.player_id.as_str().to_string());
        let verdict = if is_correct { "correct" } else { "incorrect" };
        let system_message = self
            .system_message(session, &format!("{name}'s answer was {verdict}!"))
            .await;
        self.publish(
            session,
            ServerMessage::AnswerResult {
                result: result.into(),
                system_message: system_message.into(),
                state: snapshot.into(),
            },
        )
        .await;
        Ok(true)
    }

    /// 設定変更。マージ後の設定全体をブロードキャストする
    pub async fn update_config(
        &self,
        session: &SessionContext,
        patch: Map<String, Value>,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .room_repository
            .update_config(&session.room_id, &session.client_id, patch)
            .await;
        let Some(config) = self.host_only(session, "config_update", result)? else {
            return Ok(false);
        };
        let name = self
            .room_repository
            .display_name(&session.room_id, &session.client_id)
            .await?;
        let system_message = self
            .system_message(session, &format!("Configuration updated by {name}"))
            .await;
        self.publish(
            session,
            ServerMessage::ConfigUpdate {
                config,
                updated_by: session.client_id.as_str().to_string(),
                system_message: system_message.into(),
            },
        )
        .await;
        Ok(true)
    }

    pub async fn update_song(
        &self,
        session: &SessionContext,
        song: Option<Value>,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .room_repository
            .set_current_song(&session.room_id, &session.client_id, song.clone())
            .await;
        let Some(snapshot) = self.host_only(session, "song_update", result)? else {
            return Ok(false);
        };
        let (state, system_message) = self
            .state_with_message(session, snapshot, "The song has changed")
            .await;
        self.publish(
            session,
            ServerMessage::SongUpdate {
                song,
                state,
                system_message,
            },
        )
        .await;
        Ok(true)
    }

    async fn state_with_message(
        &self,
        session: &SessionContext,
        snapshot: RoomSnapshot,
        content: &str,
    ) -> (RoomStateDto, ChatMessageDto) {
        let system_message = self.system_message(session, content).await;
        (snapshot.into(), system_message.into())
    }
}
