//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 名簿からの削除、レジストリからの削除、残りのメンバーへの通知、空ルームの削除
//!
//! ### なぜこのテストが必要か
//! - 名簿とレジストリは常に同期している必要がある
//! - 最後の参加者が抜けたルームはチャット履歴ごと削除される
//!
//! ### どのような状況を想定しているか
//! - 正常系：他のメンバーが残る切断
//! - エッジケース：最後の参加者の切断（ルーム削除）

use std::sync::Arc;

use buzzquiz_shared::time::Clock;

use crate::{
    domain::{ChatRepository, ConnectionRegistry, Role, RoomId, RoomRepository, Timestamp},
    infrastructure::dto::websocket::ServerMessage,
};

use super::{RoomLifecycle, SessionContext, outbound::broadcast};

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnected {
    /// 名簿上で空いた役割
    pub vacated: Option<Role>,
    /// ルームが空になり削除されたか
    pub room_deleted: bool,
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    lifecycle: Arc<RoomLifecycle>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        chat_repository: Arc<dyn ChatRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        lifecycle: Arc<RoomLifecycle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_repository,
            chat_repository,
            registry,
            lifecycle,
            clock,
        }
    }

    /// 参加者切断を実行
    ///
    /// 接続ごとに 1 回だけ、制御ループの終了後に呼ばれます。
    pub async fn execute(&self, session: &SessionContext) -> Disconnected {
        let SessionContext {
            room_id, client_id, ..
        } = session;

        let departure = match self
            .room_repository
            .remove_connection(room_id, client_id)
            .await
        {
            Ok(departure) => departure,
            Err(e) => {
                tracing::warn!("Room of client '{}' is already gone: {}", client_id, e);
                self.registry.disconnect(client_id).await;
                return Disconnected {
                    vacated: None,
                    room_deleted: false,
                };
            }
        };

        let at = Timestamp::new(self.clock.now_jst_millis());
        let system_message = self
            .chat_repository
            .append_system(
                room_id,
                &format!("{} left the game", departure.display_name),
                at,
            )
            .await;

        self.registry.disconnect(client_id).await;
        tracing::info!("Client '{}' left room '{}'", client_id, room_id);

        broadcast(
            self.registry.as_ref(),
            room_id,
            &ServerMessage::PlayerDisconnected {
                player: client_id.as_str().to_string(),
                system_message: system_message.into(),
                players: departure.players.into(),
            },
            None,
        )
        .await;

        let room_deleted = departure.is_empty && self.delete_room_if_empty(room_id).await;

        Disconnected {
            vacated: departure.vacated,
            room_deleted,
        }
    }

    /// 空のままならルームと履歴を削除する。同じ ID への参加はこの間待たされる
    async fn delete_room_if_empty(&self, room_id: &RoomId) -> bool {
        let _teardown = self.lifecycle.teardown().await;
        if !self.room_repository.delete_if_empty(room_id).await {
            return false;
        }
        self.chat_repository.delete_room(room_id).await;
        tracing::info!("Room '{}' deleted (empty)", room_id);
        true
    }
}
