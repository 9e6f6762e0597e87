//! Runtime configuration of the session server.

use std::time::Duration;

use crate::infrastructure::{
    connection_registry::websocket::DEFAULT_SEND_TIMEOUT, repository::DEFAULT_MAX_CHAT_HISTORY,
};

/// Smallest accepted per-connection outbound buffer.
///
/// The three join pushes are queued before the socket writer starts.
pub const MIN_OUTBOUND_BUFFER: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Time a single send may wait on a full outbound buffer
    pub send_timeout: Duration,
    /// Capacity of each connection's outbound queue
    pub outbound_buffer: usize,
    /// Number of chat messages pushed to a joining client
    pub join_history: usize,
    /// Chat messages kept per room
    pub max_chat_history: usize,
    pub cleanup_interval: Duration,
    /// Empty rooms younger than this survive the sweep
    pub empty_room_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            outbound_buffer: 64,
            join_history: 30,
            max_chat_history: DEFAULT_MAX_CHAT_HISTORY,
            cleanup_interval: Duration::from_secs(60),
            empty_room_ttl: Duration::from_secs(600),
        }
    }
}

impl ServerConfig {
    /// Outbound buffer size, never below [`MIN_OUTBOUND_BUFFER`]
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_buffer.max(MIN_OUTBOUND_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_capacity_has_lower_bound() {
        // テスト項目: 送信バッファは最小値を下回らない
        // given (前提条件):
        let config = ServerConfig {
            outbound_buffer: 1,
            ..ServerConfig::default()
        };

        // when (操作):
        let capacity = config.outbound_capacity();

        // then (期待する結果):
        assert_eq!(capacity, MIN_OUTBOUND_BUFFER);
        assert_eq!(ServerConfig::default().outbound_capacity(), 64);
    }
}
