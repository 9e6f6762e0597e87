//! WebSocket message DTOs.
//!
//! Every frame is a JSON object with a `type` discriminator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{BuzzerState, GameConfig, GameState, Role, SenderRole};

// ========================================
// Client → Server
// ========================================

/// Inbound message from a connected client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ChatMessage {
        #[serde(default)]
        content: String,
    },
    GetPlayerList,
    ConfigUpdate {
        #[serde(default)]
        config: Map<String, Value>,
    },
    Buzz,
    StartGame,
    PauseGame,
    EndGame,
    ValidateAnswer {
        #[serde(default)]
        is_correct: bool,
    },
    SongUpdate {
        #[serde(default)]
        song: Option<Value>,
    },
}

// ========================================
// Server → Client
// ========================================

/// Chat message as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub room_id: String,
    pub sender_role: SenderRole,
    pub is_system: bool,
    /// RFC 3339 (JST)
    pub timestamp: String,
    /// Only set on the echo sent back to the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummaryDto {
    pub name: String,
    pub score: u32,
}

/// player id → {name, score}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayersDto(pub BTreeMap<String, PlayerSummaryDto>);

/// Full room state pushed on join and attached to state-changing events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateDto {
    pub id: String,
    pub name: String,
    pub has_password: bool,
    pub game_state: GameState,
    pub buzzer_state: BuzzerState,
    pub current_buzzer: Option<String>,
    pub buzzer_timestamp: Option<String>,
    pub players: PlayersDto,
    pub config: GameConfig,
    pub current_song: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResultDto {
    pub player_id: String,
    pub is_correct: bool,
    pub scores: PlayersDto,
}

/// Outbound message pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PlayerList {
        players: PlayersDto,
    },
    ChatHistory {
        messages: Vec<ChatMessageDto>,
    },
    RoomState {
        state: RoomStateDto,
    },
    PlayerJoined {
        player: String,
        name: String,
        role: Role,
    },
    ChatMessage {
        message: ChatMessageDto,
    },
    ConfigUpdate {
        config: GameConfig,
        updated_by: String,
        system_message: ChatMessageDto,
    },
    Buzz {
        player: String,
        timestamp: String,
        system_message: ChatMessageDto,
    },
    GameStarted {
        state: RoomStateDto,
        system_message: ChatMessageDto,
    },
    GamePaused {
        state: RoomStateDto,
        system_message: ChatMessageDto,
    },
    GameEnded {
        state: RoomStateDto,
        system_message: ChatMessageDto,
    },
    AnswerResult {
        result: AnswerResultDto,
        system_message: ChatMessageDto,
        state: RoomStateDto,
    },
    SongUpdate {
        song: Option<Value>,
        state: RoomStateDto,
        system_message: ChatMessageDto,
    },
    PlayerDisconnected {
        player: String,
        system_message: ChatMessageDto,
        players: PlayersDto,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Plain-text echo for a frame whose `type` is unknown.
pub fn unknown_kind_echo(frame: &str) -> String {
    format!("Message received: {frame}")
}

/// Plain-text echo for a frame that is not JSON.
pub fn non_json_echo(frame: &str) -> String {
    format!("Non-JSON message received: {frame}")
}
