pub mod chat;
pub mod room;

pub use chat::{DEFAULT_MAX_CHAT_HISTORY, InMemoryChatRepository};
pub use room::InMemoryRoomRepository;
