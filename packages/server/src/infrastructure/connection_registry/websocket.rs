//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - 接続中のクライアントと、その送信チャンネル・ルーム・役割の対応を管理
//! - 宛先指定の送信とブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された mpsc の送信側を受け取り、メッセージ送信に使用します。
//!
//! ブロードキャストでは、読み取りロックの中で宛先のスナップショットだけを取り、
//! 実際の送信はロックを外してから並行に行います。遅いクライアントがいても
//! 他のクライアントへの送信やレジストリの更新は待たされません。
//! 1 件の送信は `send_timeout` で打ち切られます。

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::RwLock;

use crate::domain::{ClientId, ConnectionError, ConnectionRegistry, PusherChannel, Role, RoomId};

/// 1 件の送信を待つ時間のデフォルト値
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
struct ConnectionEntry {
    channel: PusherChannel,
    room_id: RoomId,
    role: Role,
}

/// WebSocket を使った ConnectionRegistry 実装
pub struct WebSocketConnectionRegistry {
    /// Key: client_id, Value: 送信チャンネルと所属
    connections: RwLock<HashMap<ClientId, ConnectionEntry>>,
    send_timeout: Duration,
}

impl Default for WebSocketConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

impl WebSocketConnectionRegistry {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            send_timeout,
        }
    }

    /// 条件に合う接続の送信チャンネルを複製して返す
    async fn targets(
        &self,
        room_id: &RoomId,
        role: Option<Role>,
        exclude: Option<&ClientId>,
    ) -> Vec<(ClientId, PusherChannel)> {
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|(id, entry)| {
                &entry.room_id == room_id
                    && role.is_none_or(|r| entry.role == r)
                    && exclude != Some(*id)
            })
            .map(|(id, entry)| (id.clone(), entry.channel.clone()))
            .collect()
    }

    async fn deliver(&self, client_id: &ClientId, channel: &PusherChannel, message: &str) -> bool {
        match channel
            .send_timeout(message.to_string(), self.send_timeout)
            .await
        {
            Ok(()) => {
                tracing::debug!("Pushed message to client '{}'", client_id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to push message to client '{}': {}", client_id, e);
                false
            }
        }
    }

    async fn fan_out(&self, targets: Vec<(ClientId, PusherChannel)>, message: &str) -> usize {
        let attempted = targets.len();
        join_all(
            targets
                .iter()
                .map(|(id, channel)| self.deliver(id, channel, message)),
        )
        .await;
        attempted
    }
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn connect(
        &self,
        client_id: ClientId,
        room_id: RoomId,
        role: Role,
        channel: PusherChannel,
    ) -> Result<(), ConnectionError> {
        if channel.is_closed() {
            return Err(ConnectionError::ChannelClosed(client_id.into_string()));
        }
        let mut connections = self.connections.write().await;
        if connections.contains_key(&client_id) {
            return Err(ConnectionError::DuplicateClientId(
                client_id.into_string(),
            ));
        }
        tracing::debug!(
            "Client '{}' registered to room '{}' as {}",
            client_id,
            room_id,
            role
        );
        connections.insert(
            client_id,
            ConnectionEntry {
                channel,
                room_id,
                role,
            },
        );
        Ok(())
    }

    async fn disconnect(&self, client_id: &ClientId) -> Option<RoomId> {
        let removed = self.connections.write().await.remove(client_id);
        if removed.is_some() {
            tracing::debug!("Client '{}' unregistered", client_id);
        }
        removed.map(|entry| entry.room_id)
    }

    async fn send(&self, client_id: &ClientId, message: &str) -> bool {
        let channel = {
            let connections = self.connections.read().await;
            connections.get(client_id).map(|entry| entry.channel.clone())
        };
        match channel {
            Some(channel) => self.deliver(client_id, &channel, message).await,
            None => {
                tracing::warn!("Client '{}' not found, message dropped", client_id);
                false
            }
        }
    }

    async fn broadcast_to_room(
        &self,
        room_id: &RoomId,
        message: &str,
        exclude: Option<&ClientId>,
    ) -> usize {
        let targets = self.targets(room_id, None, exclude).await;
        self.fan_out(targets, message).await
    }

    async fn broadcast_to_role(
        &self,
        room_id: &RoomId,
        role: Role,
        message: &str,
        exclude: Option<&ClientId>,
    ) -> usize {
        let targets = self.targets(room_id, Some(role), exclude).await;
        self.fan_out(targets, message).await
    }

    async fn clients_in_room(&self, room_id: &RoomId) -> Vec<ClientId> {
        let connections = self.connections.read().await;
        let mut ids: Vec<ClientId> = connections
            .iter()
            .filter(|(_, entry)| &entry.room_id == room_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    async fn client_role(&self, client_id: &ClientId) -> Option<Role> {
        let connections = self.connections.read().await;
        connections.get(client_id).map(|entry| entry.role)
    }

    async fn client_room(&self, client_id: &ClientId) -> Option<RoomId> {
        let connections = self.connections.read().await;
        connections.get(client_id).map(|entry| entry.room_id.clone())
    }

    async fn count_clients_in_room(&self, room_id: &RoomId) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|entry| &entry.room_id == room_id)
            .count()
    }
}
