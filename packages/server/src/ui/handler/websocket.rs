//! WebSocket connection handlers.
//!
//! One task pair per connection: the receive loop decodes frames one at a time in arrival
//! order, and the pusher loop drains the connection's outbound queue into the socket.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ClientId, Role, RoomId},
    ui::state::AppState,
    usecase::{DispatchMessageUseCase, JoinParams, SessionContext},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub client_id: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, query))
}

/// Validate the path and query before anything is registered.
///
/// Returns the close reason on failure.
fn parse_join_params(room_id: String, query: ConnectQuery) -> Result<JoinParams, &'static str> {
    let client_id = query
        .client_id
        .filter(|id| !id.trim().is_empty())
        .ok_or("client_id is required")?;
    let client_id = ClientId::new(client_id).map_err(|_| "invalid client_id")?;
    let room_id = RoomId::new(room_id).map_err(|_| "invalid room_id")?;
    let role = match query.role.as_deref() {
        None | Some("") => Role::Player,
        Some(role) => role.parse::<Role>().map_err(|_| "invalid role")?,
    };
    let name = query
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(JoinParams {
        room_id,
        client_id,
        role,
        name,
        password: query.password,
    })
}

async fn close_with_policy_violation(mut socket: WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: Utf8Bytes::from_static(reason),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

/// Dispatch inbound frames one at a time until the peer closes or `stop` is cancelled.
///
/// `stop` is only observed between frames, so a frame that is already being handled always
/// completes with all of its broadcasts.
async fn receive_loop<S, E>(
    mut receiver: S,
    dispatcher: Arc<DispatchMessageUseCase>,
    session: SessionContext,
    stop: CancellationToken,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            next = receiver.next() => next,
        };
        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error from '{}': {}", session.client_id, e);
                break;
            }
            None => break,
        };
        match msg {
            Message::Text(text) => {
                tracing::debug!("Received text from '{}': {}", session.client_id, text);
                dispatcher.execute(&session, text.as_str()).await;
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", session.client_id);
                break;
            }
            Message::Binary(_) => {
                tracing::debug!("Ignored binary frame from '{}'", session.client_id);
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: String,
    query: ConnectQuery,
) {
    let params = match parse_join_params(room_id, query) {
        Ok(params) => params,
        Err(reason) => {
            tracing::warn!("Rejected WebSocket connection: {}", reason);
            close_with_policy_violation(socket, reason).await;
            return;
        }
    };

    // The initial pushes are queued here before the pusher loop starts
    let (tx, rx) = mpsc::channel(state.outbound_capacity);
    let session = match state.connect_participant_usecase.execute(params, tx).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            close_with_policy_violation(socket, e.close_reason()).await;
            return;
        }
    };

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let stop = CancellationToken::new();
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        state.dispatch_message_usecase.clone(),
        session.clone(),
        stop.clone(),
    ));

    let pusher_finished = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => true,
    };
    if pusher_finished {
        // The frame being dispatched must finish before the disconnect runs
        stop.cancel();
        if let Err(e) = recv_task.await {
            tracing::error!("Receive loop of '{}' failed: {}", session.client_id, e);
        }
    } else {
        send_task.abort();
    }

    let result = state.disconnect_participant_usecase.execute(&session).await;
    tracing::info!(
        "Client '{}' disconnected from room '{}'{}",
        session.client_id,
        session.room_id,
        if result.room_deleted { " (room deleted)" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomRepository;
    use crate::usecase::test_support::{Fixture, drain};

    fn query(client_id: Option<&str>, role: Option<&str>) -> ConnectQuery {
        ConnectQuery {
            client_id: client_id.map(str::to_string),
            role: role.map(str::to_string),
            ..ConnectQuery::default()
        }
    }

    #[test]
    fn test_missing_client_id_is_rejected() {
        // テスト項目: client_id がない・空の場合は拒否される
        // given (前提条件):

        // when (操作):
        let missing = parse_join_params("r1".to_string(), query(None, None));
        let blank = parse_join_params("r1".to_string(), query(Some("  "), None));

        // then (期待する結果):
        assert_eq!(missing.unwrap_err(), "client_id is required");
        assert_eq!(blank.unwrap_err(), "client_id is required");
    }

    #[test]
    fn test_role_defaults_to_player() {
        // テスト項目: role を省略するとプレイヤーとして参加する
        // given (前提条件):

        // when (操作):
        let params = parse_join_params("r1".to_string(), query(Some("alice"), None)).unwrap();

        // then (期待する結果):
        assert_eq!(params.role, Role::Player);
        assert_eq!(params.client_id.as_str(), "alice");
        assert_eq!(params.name, None);
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        // テスト項目: 未知の role は拒否される
        // given (前提条件):

        // when (操作):
        let result = parse_join_params("r1".to_string(), query(Some("alice"), Some("admin")));

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), "invalid role");
    }

    #[test]
    fn test_name_is_trimmed() {
        // テスト項目: 表示名は前後の空白が取り除かれ、空なら省略扱いになる
        // given (前提条件):
        let named = ConnectQuery {
            name: Some("  Alice ".to_string()),
            ..query(Some("alice"), Some("host"))
        };

        // when (操作):
        let params = parse_join_params("r1".to_string(), named).unwrap();

        // then (期待する結果):
        assert_eq!(params.name, Some("Alice".to_string()));
        assert_eq!(params.role, Role::Host);
    }

    #[tokio::test]
    async fn test_frame_in_flight_completes_when_stopped() {
        // テスト項目: 受信ループの停止要求が処理中のバズと重なっても、バズは最後まで処理され全員に届く
        // given (前提条件):
        let fixture = Fixture::new();
        let (p1, mut p1_rx) = fixture.join("r1", "p1", Role::Player).await;
        let (_p2, mut p2_rx) = fixture.join("r1", "p2", Role::Player).await;
        fixture.game_usecase().start_game(&p1).await.unwrap();
        drain(&mut p1_rx);
        drain(&mut p2_rx);

        // バズのフレームを渡すのと同時に停止を要求し、その後はフレームが来ない
        let stop = CancellationToken::new();
        let stop_on_receive = stop.clone();
        let frames = futures_util::stream::once(async move {
            stop_on_receive.cancel();
            Ok::<_, axum::Error>(Message::Text(r#"{"type":"buzz"}"#.into()))
        })
        .chain(futures_util::stream::pending());

        // when (操作):
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            receive_loop(
                Box::pin(frames),
                Arc::new(fixture.dispatch_usecase()),
                p1.clone(),
                stop,
            ),
        )
        .await
        .expect("receive loop stops after the frame in flight");

        // then (期待する結果):
        let received = drain(&mut p2_rx);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["type"], "buzz");
        assert_eq!(received[0]["player"], "p1");
        let room = fixture.rooms.snapshot(&p1.room_id).await.unwrap();
        assert_eq!(room.current_buzzer, Some(p1.client_id.clone()));
    }
}
