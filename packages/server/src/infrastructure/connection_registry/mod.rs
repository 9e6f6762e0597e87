//! 接続レジストリの実装
//!
//! ## 実装
//!
//! - `websocket`: WebSocket の送信タスクにつながる mpsc チャンネルを管理する実装

pub mod websocket;

pub use websocket::WebSocketConnectionRegistry;
