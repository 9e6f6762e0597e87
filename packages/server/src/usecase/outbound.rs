//! 送信メッセージのエンコードと送信

use crate::domain::{ClientId, ConnectionRegistry, RoomId};
use crate::infrastructure::dto::websocket::ServerMessage;

/// JSON にエンコードする。失敗した場合はログを残して None
pub(crate) fn encode(message: &ServerMessage) -> Option<String> {
    match message.to_json() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to encode outbound message: {}", e);
            None
        }
    }
}

pub(crate) async fn send_to(
    registry: &dyn ConnectionRegistry,
    client_id: &ClientId,
    message: &ServerMessage,
) -> bool {
    match encode(message) {
        Some(json) => registry.send(client_id, &json).await,
        None => false,
    }
}

pub(crate) async fn broadcast(
    registry: &dyn ConnectionRegistry,
    room_id: &RoomId,
    message: &ServerMessage,
    exclude: Option<&ClientId>,
) -> usize {
    match encode(message) {
        Some(json) => registry.broadcast_to_room(room_id, &json, exclude).await,
        None => 0,
    }
}
