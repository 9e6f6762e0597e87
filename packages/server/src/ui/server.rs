//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use buzzquiz_shared::time::Clock;
use tokio::{net::TcpListener, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{ChatRepository, ConnectionRegistry, RoomRepository},
    infrastructure::{
        connection_registry::WebSocketConnectionRegistry,
        repository::{InMemoryChatRepository, InMemoryRoomRepository},
    },
    usecase::{
        CheckRoomPasswordUseCase, CleanupRoomsUseCase, ConnectParticipantUseCase,
        CreateRoomUseCase, DisconnectParticipantUseCase, DispatchMessageUseCase,
        GameControlUseCase, GetChatHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        RoomLifecycle, SendChatMessageUseCase,
    },
};

use super::{
    handler::{
        check_room_password, create_room, get_chat_history, get_room_detail, get_rooms,
        health_check, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Buzzer quiz session server
///
/// # Example
///
/// ```ignore
/// let server = Server::in_memory(ServerConfig::default(), Arc::new(SystemClock));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    /// CleanupRoomsUseCase（空ルーム掃除のユースケース）
    cleanup_rooms_usecase: Arc<CleanupRoomsUseCase>,
    cleanup_interval: Duration,
}

impl Server {
    /// Wire the server on in-memory stores
    ///
    /// Dependencies are initialized in order:
    /// 1. Repositories
    /// 2. ConnectionRegistry
    /// 3. UseCases
    /// 4. AppState
    pub fn in_memory(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Create Repositories (in-memory database)
        let room_repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let chat_repository: Arc<dyn ChatRepository> =
            Arc::new(InMemoryChatRepository::new(config.max_chat_history));

        // 2. Create ConnectionRegistry (WebSocket implementation)
        let registry: Arc<dyn ConnectionRegistry> =
            Arc::new(WebSocketConnectionRegistry::new(config.send_timeout));

        // 3. Create UseCases
        let lifecycle = Arc::new(RoomLifecycle::new());
        let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
            room_repository.clone(),
            chat_repository.clone(),
            registry.clone(),
            lifecycle.clone(),
            clock.clone(),
            config.join_history,
        ));
        let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
            room_repository.clone(),
            chat_repository.clone(),
            registry.clone(),
            lifecycle.clone(),
            clock.clone(),
        ));
        let send_chat_message_usecase = Arc::new(SendChatMessageUseCase::new(
            room_repository.clone(),
            chat_repository.clone(),
            registry.clone(),
            clock.clone(),
        ));
        let game_control_usecase = Arc::new(GameControlUseCase::new(
            room_repository.clone(),
            chat_repository.clone(),
            registry.clone(),
            clock.clone(),
        ));
        let dispatch_message_usecase = Arc::new(DispatchMessageUseCase::new(
            room_repository.clone(),
            registry.clone(),
            send_chat_message_usecase,
            game_control_usecase,
        ));
        let create_room_usecase = Arc::new(CreateRoomUseCase::new(
            room_repository.clone(),
            clock.clone(),
        ));
        let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(room_repository.clone()));
        let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(room_repository.clone()));
        let get_chat_history_usecase = Arc::new(GetChatHistoryUseCase::new(
            room_repository.clone(),
            chat_repository.clone(),
        ));
        let check_room_password_usecase =
            Arc::new(CheckRoomPasswordUseCase::new(room_repository.clone()));
        let cleanup_rooms_usecase = Arc::new(CleanupRoomsUseCase::new(
            room_repository,
            chat_repository,
            lifecycle,
            clock,
            config.empty_room_ttl,
        ));

        // 4. Create AppState
        let app_state = Arc::new(AppState {
            connect_participant_usecase,
            disconnect_participant_usecase,
            dispatch_message_usecase,
            create_room_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
            get_chat_history_usecase,
            check_room_password_usecase,
            outbound_capacity: config.outbound_capacity(),
        });

        Self {
            app_state,
            cleanup_rooms_usecase,
            cleanup_interval: config.cleanup_interval,
        }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/{room_id}/chat", get(get_chat_history))
            .route("/api/rooms/{room_id}/password", post(check_room_password))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Buzzer quiz server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{room_id}}?client_id=...", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// The empty-room sweep runs alongside the server and stops with it.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweep = spawn_cleanup_task(self.cleanup_rooms_usecase, self.cleanup_interval);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweep.abort();
        result
    }
}

fn spawn_cleanup_task(
    usecase: Arc<CleanupRoomsUseCase>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // A zero period would make `interval` panic
        let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let report = usecase.execute().await;
            if report.rooms_removed > 0 {
                tracing::info!(
                    "Cleanup removed {} empty room(s) and {} chat history(ies)",
                    report.rooms_removed,
                    report.histories_removed
                );
            }
        }
    })
}
