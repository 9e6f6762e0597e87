//! ConnectionRegistry trait 定義
//!
//! 「誰がどのルームにどの役割で接続しているか」の唯一の情報源です。
//! 宛先指定の送信と、ルーム／役割単位のブロードキャストを提供します。
//!
//! ## 送信の失敗
//!
//! 送信はベストエフォートです。個々の失敗はログに残すだけで呼び出し元には伝播せず、
//! 接続の削除も行いません（削除は `disconnect` のみ）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientId, ConnectionError, Role, RoomId};

/// クライアントへの送信チャンネル（WebSocket の送信タスクにつながる）
pub type PusherChannel = mpsc::Sender<String>;

#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を登録する
    async fn connect(
        &self,
        client_id: ClientId,
        room_id: RoomId,
        role: Role,
        channel: PusherChannel,
    ) -> Result<(), ConnectionError>;

    /// 接続を削除し、所属していたルームを返す
    async fn disconnect(&self, client_id: &ClientId) -> Option<RoomId>;

    /// 1 クライアントに送信。届けられたかを返す
    async fn send(&self, client_id: &ClientId, message: &str) -> bool;

    /// ルームの全員（`exclude` を除く）に送信し、送信を試みた数を返す
    async fn broadcast_to_room(
        &self,
        room_id: &RoomId,
        message: &str,
        exclude: Option<&ClientId>,
    ) -> usize;

    /// ルーム内の指定した役割の全員に送信し、送信を試みた数を返す
    async fn broadcast_to_role(
        &self,
        room_id: &RoomId,
        role: Role,
        message: &str,
        exclude: Option<&ClientId>,
    ) -> usize;

    async fn clients_in_room(&self, room_id: &RoomId) -> Vec<ClientId>;

    async fn client_role(&self, client_id: &ClientId) -> Option<Role>;

    async fn client_room(&self, client_id: &ClientId) -> Option<RoomId>;

    async fn count_clients_in_room(&self, room_id: &RoomId) -> usize;

    async fn is_room_empty(&self, room_id: &RoomId) -> bool {
        self.count_clients_in_room(room_id).await == 0
    }
}
