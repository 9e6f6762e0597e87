//! Domain entities.

mod chat_message;
mod room;

pub use chat_message::{ChatMessage, SYSTEM_SENDER_ID, SYSTEM_SENDER_NAME};
pub use room::{AnswerResult, Player, PlayerList, PlayerSummary, Room, RoomSnapshot, RoomSummary};
