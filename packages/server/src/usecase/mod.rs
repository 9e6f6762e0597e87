//! UseCase layer: one struct per operation, wired with the store and registry traits.
//!
//! The per-connection session flow is split across three use cases:
//! `ConnectParticipantUseCase` on join, `DispatchMessageUseCase` for every inbound frame
//! and `DisconnectParticipantUseCase` once the connection closes.

mod check_room_password;
mod cleanup_rooms;
mod connect_participant;
mod create_room;
mod disconnect_participant;
mod dispatch_message;
mod error;
mod game_control;
mod get_chat_history;
mod get_room_detail;
mod get_rooms;
mod outbound;
mod room_lifecycle;
mod send_chat_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use check_room_password::CheckRoomPasswordUseCase;
pub use cleanup_rooms::{CleanupReport, CleanupRoomsUseCase};
pub use connect_participant::{ConnectParticipantUseCase, JoinParams};
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::{DisconnectParticipantUseCase, Disconnected};
pub use dispatch_message::DispatchMessageUseCase;
pub use error::{CheckPasswordError, ConnectError, GetChatHistoryError, GetRoomDetailError};
pub use game_control::GameControlUseCase;
pub use get_chat_history::{DEFAULT_HISTORY_LIMIT, GetChatHistoryUseCase};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use room_lifecycle::RoomLifecycle;
pub use send_chat_message::SendChatMessageUseCase;

use crate::domain::{ClientId, Role, RoomId};

/// 接続中のクライアントの所属（接続が閉じるまで変わらない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub room_id: RoomId,
    pub client_id: ClientId,
    pub role: Role,
}
