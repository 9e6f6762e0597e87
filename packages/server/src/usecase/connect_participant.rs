//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - ルームの解決（自動作成）、レジストリ登録、名簿への追加、初期状態の送信
//!
//! ### なぜこのテストが必要か
//! - 参加直後のクライアントは 3 つの初期メッセージで画面を組み立てる
//! - 重複した client_id やパスワード不一致で中途半端な登録が残らないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ルームへの参加、既存ルームへの参加
//! - 異常系：重複した client_id、パスワード不一致

use std::sync::Arc;

use buzzquiz_shared::time::Clock;

use crate::{
    domain::{
        ChatRepository, ClientId, ConnectionError, ConnectionRegistry, JoinRequest, PusherChannel,
        RepositoryError, Role, RoomId, RoomRepository, Timestamp,
    },
    infrastructure::dto::websocket::{ChatMessageDto, ServerMessage},
};

use super::{
    RoomLifecycle, SessionContext,
    error::ConnectError,
    outbound::{broadcast, send_to},
};

/// 接続時にクライアントが指定するパラメータ
#[derive(Debug, Clone)]
pub struct JoinParams {
    pub room_id: RoomId,
    pub client_id: ClientId,
    pub role: Role,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    lifecycle: Arc<RoomLifecycle>,
    clock: Arc<dyn Clock>,
    /// 参加時に送るチャット履歴の件数
    join_history: usize,
}

impl ConnectParticipantUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        chat_repository: Arc<dyn ChatRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        lifecycle: Arc<RoomLifecycle>,
        clock: Arc<dyn Clock>,
        join_history: usize,
    ) -> Self {
        Self {
            room_repository,
            chat_repository,
            registry,
            lifecycle,
            clock,
            join_history,
        }
    }

    /// 参加者接続を実行
    ///
    /// 1. レジストリに登録（client_id の重複はここで弾く）
    /// 2. ルームに参加（未知のルーム ID ならその ID で作成）
    /// 3. システムメッセージを追加
    /// 4. 本人に player_list → chat_history → room_state の順で送信
    /// 5. 他のメンバーに player_joined をブロードキャスト
    ///
    /// 2 が失敗した場合は 1 の登録を取り消します。
    pub async fn execute(
        &self,
        params: JoinParams,
        channel: PusherChannel,
    ) -> Result<SessionContext, ConnectError> {
        let JoinParams {
            room_id,
            client_id,
            role,
            name,
            password,
        } = params;

        self.registry
            .connect(client_id.clone(), room_id.clone(), role, channel)
            .await
            .map_err(|e| match e {
                ConnectionError::DuplicateClientId(id) => ConnectError::DuplicateClientId(id),
                ConnectionError::ChannelClosed(_) => ConnectError::ConnectionClosed,
            })?;

        // 参加メッセージを追加するまで、同じルームの履歴が削除されないようにする
        let lifecycle = self.lifecycle.join().await;
        let joined_at = Timestamp::new(self.clock.now_jst_millis());
        let outcome = match self
            .room_repository
            .join_or_create(JoinRequest {
                room_id: room_id.clone(),
                client_id: client_id.clone(),
                role,
                name,
                password,
                joined_at,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.registry.disconnect(&client_id).await;
                return Err(match e {
                    RepositoryError::InvalidPassword(_) => ConnectError::InvalidPassword,
                    other => ConnectError::Repository(other),
                });
            }
        };

        let display_name = outcome
            .snapshot
            .players
            .get(&client_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| client_id.as_str().to_string());
        tracing::info!(
            "Client '{}' joined room '{}' as {}{}",
            client_id,
            room_id,
            role,
            if outcome.created { " (room created)" } else { "" }
        );

        self.chat_repository
            .append_system(
                &room_id,
                &format!("Player {display_name} joined the game"),
                joined_at,
            )
            .await;
        drop(lifecycle);

        let history: Vec<ChatMessageDto> = self
            .chat_repository
            .history(&room_id, self.join_history)
            .await
            .into_iter()
            .map(Into::into)
            .collect();
        let initial = [
            ServerMessage::PlayerList {
                players: outcome.snapshot.players.clone().into(),
            },
            ServerMessage::ChatHistory { messages: history },
            ServerMessage::RoomState {
                state: outcome.snapshot.into(),
            },
        ];
        for message in &initial {
            send_to(self.registry.as_ref(), &client_id, message).await;
        }

        broadcast(
            self.registry.as_ref(),
            &room_id,
            &ServerMessage::PlayerJoined {
                player: client_id.as_str().to_string(),
                name: display_name,
                role,
            },
            Some(&client_id),
        )
        .await;

        Ok(SessionContext {
            room_id,
            client_id,
            role,
        })
    }
}
