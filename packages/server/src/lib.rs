//! Real-time session core for a multiplayer music buzzer quiz.
//!
//! Hosts, players and spectators join a room over a WebSocket, exchange control
//! messages (buzz, configuration, answer validation, chat) and receive ordered
//! broadcasts of the room state.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
