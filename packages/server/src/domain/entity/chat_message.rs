//! チャットメッセージ エンティティ

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ClientId, Role, RoomId, SenderRole, Timestamp};

/// システムメッセージの送信者 ID
pub const SYSTEM_SENDER_ID: &str = "system";
/// システムメッセージの送信者名
pub const SYSTEM_SENDER_NAME: &str = "System";

/// ルームのチャットに投稿されたメッセージ（作成後は不変）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub room_id: RoomId,
    pub sender_role: SenderRole,
    pub is_system: bool,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// 参加者が投稿したメッセージを作成
    pub fn from_participant(
        room_id: RoomId,
        sender_id: &ClientId,
        sender_name: String,
        content: String,
        role: Role,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.as_str().to_string(),
            sender_name,
            content,
            room_id,
            sender_role: role.into(),
            is_system: false,
            timestamp,
        }
    }

    /// サーバーが状態変化を伝えるシステムメッセージを作成
    pub fn system(room_id: RoomId, content: String, timestamp: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            content,
            room_id,
            sender_role: SenderRole::System,
            is_system: true,
            timestamp,
        }
    }
}
