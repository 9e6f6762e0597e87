//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::GameState;

use super::websocket::ChatMessageDto;

/// Room summary for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub has_password: bool,
    pub player_count: usize,
    pub game_state: GameState,
    /// RFC 3339 (JST)
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatHistoryQuery {
    pub limit: Option<usize>,
    pub since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessageDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordCheckRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordCheckResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
