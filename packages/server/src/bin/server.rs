//! Buzzer quiz session server.
//!
//! Hosts, players and spectators connect to `/ws/{room_id}` and share one room state.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin buzzquiz-server
//! cargo run --bin buzzquiz-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use buzzquiz_server::{config::ServerConfig, ui::Server};
use buzzquiz_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "buzzquiz-server")]
#[command(about = "Real-time buzzer quiz server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Milliseconds a send may wait on a slow client before it is skipped
    #[arg(long, default_value = "2000")]
    send_timeout_ms: u64,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value = "64")]
    outbound_buffer: usize,

    /// Chat messages pushed to a joining client
    #[arg(long, default_value = "30")]
    join_history: usize,

    /// Chat messages kept per room
    #[arg(long, default_value = "100")]
    max_chat_history: usize,

    /// Seconds between empty-room sweeps
    #[arg(long, default_value = "60")]
    cleanup_interval_secs: u64,

    /// Seconds an empty room survives before the sweep removes it
    #[arg(long, default_value = "600")]
    empty_room_ttl_secs: u64,
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        Self {
            send_timeout: Duration::from_millis(args.send_timeout_ms),
            outbound_buffer: args.outbound_buffer,
            join_history: args.join_history,
            max_chat_history: args.max_chat_history,
            cleanup_interval: Duration::from_secs(args.cleanup_interval_secs),
            empty_room_ttl: Duration::from_secs(args.empty_room_ttl_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(
        env!("CARGO_BIN_NAME"),
        &["buzzquiz-server", "tower-http"],
        "debug",
    );

    let args = Args::parse();
    let config = ServerConfig::from(&args);
    tracing::debug!("Server configuration: {:?}", config);

    let server = Server::in_memory(config, Arc::new(SystemClock));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
