//! Domain layer: entities, value objects and the interfaces the session core depends on.

mod connection_registry;
mod entity;
mod error;
mod game_config;
mod repository;
mod value_object;

pub use connection_registry::{ConnectionRegistry, PusherChannel};
pub use entity::{
    AnswerResult, ChatMessage, Player, PlayerList, PlayerSummary, Room, RoomSnapshot, RoomSummary,
    SYSTEM_SENDER_ID, SYSTEM_SENDER_NAME,
};
pub use error::{ConnectionError, RepositoryError, ValueObjectError};
pub use game_config::GameConfig;
#[cfg(test)]
pub use repository::MockChatRepository;
pub use repository::{ChatRepository, Departure, JoinOutcome, JoinRequest, RoomRepository};
pub use value_object::{
    BuzzerState, ClientId, GameState, Role, RoomId, SenderRole, Timestamp,
};
