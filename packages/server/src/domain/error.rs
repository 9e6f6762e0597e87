//! ドメイン層のエラー型

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("client_id must not be empty")]
    ClientIdEmpty,

    #[error("client_id is too long ({0} characters)")]
    ClientIdTooLong(usize),

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id is too long ({0} characters)")]
    RoomIdTooLong(usize),

    #[error("unknown role '{0}'")]
    InvalidRole(String),
}

/// Repository のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 指定されたルームが存在しない
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    /// ルームのパスワードが一致しない
    #[error("Invalid password for room '{0}'")]
    InvalidPassword(String),

    /// ホストがいるルームでホスト以外がホスト操作をした
    #[error("Client '{0}' is not the host")]
    NotHost(String),
}

/// ConnectionRegistry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// 同じ client_id が既に接続中
    #[error("Client ID '{0}' is already connected")]
    DuplicateClientId(String),

    /// 送信チャンネルが既に閉じている（ハンドシェイク失敗）
    #[error("Connection for '{0}' is already closed")]
    ChannelClosed(String),
}
