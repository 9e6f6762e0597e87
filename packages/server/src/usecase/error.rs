//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::RepositoryError;

/// 参加者接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("client id '{0}' is already connected")]
    DuplicateClientId(String),
    #[error("invalid room password")]
    InvalidPassword,
    #[error("connection closed before registration")]
    ConnectionClosed,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ConnectError {
    /// WebSocket の close frame に載せる理由
    pub fn close_reason(&self) -> &'static str {
        match self {
            ConnectError::DuplicateClientId(_) => "client_id is already connected",
            ConnectError::InvalidPassword => "invalid room password",
            ConnectError::ConnectionClosed => "connection closed",
            ConnectError::Repository(_) => "room unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetChatHistoryError {
    #[error("Room not found")]
    RoomNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Room not found")]
    RoomNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckPasswordError {
    #[error("Room not found")]
    RoomNotFound,
}
