//! Repository の実装
//!
//! - `inmemory`: プロセス内のメモリに保持する実装
//! - 将来的に: `redis` など

pub mod inmemory;

pub use inmemory::{DEFAULT_MAX_CHAT_HISTORY, InMemoryChatRepository, InMemoryRoomRepository};
