//! Value Object 定義
//!
//! 識別子・状態など、不変で値として比較されるドメインの型をまとめています。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

const MAX_CLIENT_ID_LEN: usize = 64;
const MAX_ROOM_ID_LEN: usize = 64;

/// クライアント ID（接続ごとに一意、クライアントが指定する）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// 空文字や空白のみ、長すぎる ID は拒否する
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ClientIdEmpty);
        }
        let len = value.chars().count();
        if len > MAX_CLIENT_ID_LEN {
            return Err(ValueObjectError::ClientIdTooLong(len));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム ID（不透明なトークン）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// 8 文字の短いランダム ID を生成
    pub fn generate() -> Self {
        let mut value = Uuid::new_v4().simple().to_string();
        value.truncate(8);
        Self(value)
    }

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        let len = value.chars().count();
        if len > MAX_ROOM_ID_LEN {
            return Err(ValueObjectError::RoomIdTooLong(len));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 接続の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Player,
    Spectator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Player => "player",
            Role::Spectator => "spectator",
        }
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Role::Host),
            "player" => Ok(Role::Player),
            "spectator" => Ok(Role::Spectator),
            other => Err(ValueObjectError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// チャットメッセージ送信者の役割（システムを含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Host,
    Player,
    Spectator,
    System,
}

impl From<Role> for SenderRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Host => SenderRole::Host,
            Role::Player => SenderRole::Player,
            Role::Spectator => SenderRole::Spectator,
        }
    }
}

/// ゲームの進行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    #[default]
    Waiting,
    Playing,
    Paused,
    Ended,
}

/// ブザーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuzzerState {
    #[default]
    Inactive,
    Active,
    Buzzed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_rejects_blank_and_long_values() {
        // テスト項目: 空白のみ・長すぎる client_id は拒否される
        // given (前提条件):
        let long = "x".repeat(MAX_CLIENT_ID_LEN + 1);

        // when (操作):
        let blank = ClientId::new("   ".to_string());
        let too_long = ClientId::new(long);
        let ok = ClientId::new("alice".to_string());

        // then (期待する結果):
        assert_eq!(blank, Err(ValueObjectError::ClientIdEmpty));
        assert_eq!(
            too_long,
            Err(ValueObjectError::ClientIdTooLong(MAX_CLIENT_ID_LEN + 1))
        );
        assert_eq!(ok.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_room_id_rejects_empty_value() {
        // テスト項目: 空のルーム ID は拒否される
        // given (前提条件):

        // when (操作):
        let result = RoomId::new(String::new());

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::RoomIdEmpty));
    }

    #[test]
    fn test_generated_room_ids_are_short_and_distinct() {
        // テスト項目: 生成されるルーム ID は 8 文字で、毎回異なる
        // given (前提条件):

        // when (操作):
        let first = RoomId::generate();
        let second = RoomId::generate();

        // then (期待する結果):
        assert_eq!(first.as_str().len(), 8);
        assert_ne!(first, second);
    }

    #[test]
    fn test_role_parses_known_values_only() {
        // テスト項目: 既知の役割のみパースできる
        // given (前提条件):

        // when (操作):
        let host = "host".parse::<Role>();
        let spectator = "spectator".parse::<Role>();
        let admin = "admin".parse::<Role>();

        // then (期待する結果):
        assert_eq!(host, Ok(Role::Host));
        assert_eq!(spectator, Ok(Role::Spectator));
        assert_eq!(admin, Err(ValueObjectError::InvalidRole("admin".to_string())));
    }

    #[test]
    fn test_state_enums_serialize_lowercase() {
        // テスト項目: 状態 enum は小文字の文字列としてシリアライズされる
        // given (前提条件):

        // when (操作):
        let game = serde_json::to_string(&GameState::Paused).unwrap();
        let buzzer = serde_json::to_string(&BuzzerState::Buzzed).unwrap();
        let sender = serde_json::to_string(&SenderRole::System).unwrap();

        // then (期待する結果):
        assert_eq!(game, "\"paused\"");
        assert_eq!(buzzer, "\"buzzed\"");
        assert_eq!(sender, "\"system\"");
    }
}
