//! Conversion logic from domain entities to DTOs.

use buzzquiz_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{AnswerResult, ChatMessage, PlayerList, RoomSnapshot, RoomSummary};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<ChatMessage> for dto::ChatMessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            sender_name: model.sender_name,
            content: model.content,
            room_id: model.room_id.into_string(),
            sender_role: model.sender_role,
            is_system: model.is_system,
            timestamp: timestamp_to_jst_rfc3339(model.timestamp.value()),
            is_self: None,
        }
    }
}

impl dto::ChatMessageDto {
    /// Mark as the author's own echo
    pub fn into_self_echo(self) -> Self {
        Self {
            is_self: Some(true),
            ..self
        }
    }
}

impl From<PlayerList> for dto::PlayersDto {
    fn from(players: PlayerList) -> Self {
        Self(
            players
                .into_iter()
                .map(|(id, summary)| {
                    (
                        id.into_string(),
                        dto::PlayerSummaryDto {
                            name: summary.name,
                            score: summary.score,
                        },
                    )
                })
                .collect(),
        )
    }
}

impl From<RoomSnapshot> for dto::RoomStateDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            id: snapshot.summary.id.into_string(),
            name: snapshot.summary.name,
            has_password: snapshot.summary.has_password,
            game_state: snapshot.summary.game_state,
            buzzer_state: snapshot.buzzer_state,
            current_buzzer: snapshot.current_buzzer.map(|id| id.into_string()),
            buzzer_timestamp: snapshot
                .buzzer_timestamp
                .map(|ts| timestamp_to_jst_rfc3339(ts.value())),
            players: snapshot.players.into(),
            config: snapshot.config,
            current_song: snapshot.current_song,
        }
    }
}

impl From<AnswerResult> for dto::AnswerResultDto {
    fn from(result: AnswerResult) -> Self {
        Self {
            player_id: result.player_id.into_string(),
            is_correct: result.is_correct,
            scores: result.scores.into(),
        }
    }
}

impl From<RoomSummary> for http::RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id.into_string(),
            name: summary.name,
            has_password: summary.has_password,
            player_count: summary.player_count,
            game_state: summary.game_state,
            created_at: timestamp_to_jst_rfc3339(summary.created_at.value()),
        }
    }
}
