//! InMemory Chat Repository 実装
//!
//! ルームごとのチャット履歴を `VecDeque` で保持します。
//! 履歴は上限件数を超えると古いものから捨てられます（FIFO）。

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use buzzquiz_shared::time::parse_timestamp_millis;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, ChatRepository, ClientId, Role, RoomId, Timestamp};

/// ルームあたりの履歴上限のデフォルト値
pub const DEFAULT_MAX_CHAT_HISTORY: usize = 100;

/// `since` のタイムスタンプが解釈できない時に返す件数
const SINCE_FALLBACK_COUNT: usize = 20;

/// インメモリ Chat Repository 実装
pub struct InMemoryChatRepository {
    histories: Mutex<HashMap<RoomId, VecDeque<ChatMessage>>>,
    max_history: usize,
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHAT_HISTORY)
    }
}

impl InMemoryChatRepository {
    pub fn new(max_history: usize) -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
            max_history: max_history.max(1),
        }
    }

    /// タイムスタンプはルーム内で狭義単調増加になるよう、直前のメッセージ以下なら +1 ms にずらす
    async fn push(&self, mut message: ChatMessage) -> ChatMessage {
        let mut histories = self.histories.lock().await;
        let history = histories.entry(message.room_id.clone()).or_default();
        if let Some(last) = history.back()
            && message.timestamp.value() <= last.timestamp.value()
        {
            message.timestamp = Timestamp::new(last.timestamp.value() + 1);
        }
        history.push_back(message.clone());
        while history.len() > self.max_history {
            history.pop_front();
        }
        message
    }

    fn tail(history: &VecDeque<ChatMessage>, count: usize) -> Vec<ChatMessage> {
        history
            .iter()
            .skip(history.len().saturating_sub(count))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn append(
        &self,
        room_id: &RoomId,
        sender_id: &ClientId,
        sender_name: &str,
        content: &str,
        role: Role,
        at: Timestamp,
    ) -> ChatMessage {
        let message = ChatMessage::from_participant(
            room_id.clone(),
            sender_id,
            sender_name.to_string(),
            content.to_string(),
            role,
            at,
        );
        self.push(message).await
    }

    async fn append_system(&self, room_id: &RoomId, content: &str, at: Timestamp) -> ChatMessage {
        let message = ChatMessage::system(room_id.clone(), content.to_string(), at);
        self.push(message).await
    }

    async fn history(&self, room_id: &RoomId, count: usize) -> Vec<ChatMessage> {
        let histories = self.histories.lock().await;
        histories
            .get(room_id)
            .map(|history| Self::tail(history, count))
            .unwrap_or_default()
    }

    async fn since(&self, room_id: &RoomId, timestamp: &str) -> Vec<ChatMessage> {
        let histories = self.histories.lock().await;
        let Some(history) = histories.get(room_id) else {
            return Vec::new();
        };
        match parse_timestamp_millis(timestamp) {
            Some(since) => history
                .iter()
                .filter(|m| m.timestamp.value() > since)
                .cloned()
                .collect(),
            None => {
                tracing::debug!(
                    "Unparseable timestamp '{}', returning last {} messages",
                    timestamp,
                    SINCE_FALLBACK_COUNT
                );
                Self::tail(history, SINCE_FALLBACK_COUNT)
            }
        }
    }

    async fn delete_room(&self, room_id: &RoomId) -> bool {
        self.histories.lock().await.remove(room_id).is_some()
    }

    async fn cleanup(&self, active_room_ids: &[RoomId]) -> usize {
        let active: HashSet<&RoomId> = active_room_ids.iter().collect();
        let mut histories = self.histories.lock().await;
        let before = histories.len();
        histories.retain(|room_id, _| active.contains(room_id));
        let removed = before - histories.len();
        if removed > 0 {
            tracing::info!("Cleaned up chat history of {} inactive room(s)", removed);
        }
        removed
    }
}
