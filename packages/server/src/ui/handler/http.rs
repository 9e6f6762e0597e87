//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::{
        http::{
            ChatHistoryQuery, ChatHistoryResponse, CreateRoomRequest, CreateRoomResponse,
            ErrorResponse, HealthResponse, PasswordCheckRequest, PasswordCheckResponse,
            RoomSummaryDto,
        },
        websocket::ChatMessageDto,
    },
    ui::state::AppState,
    usecase::{GetChatHistoryError, GetRoomDetailError},
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn room_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Room not found")))
}

fn parse_room_id(room_id: String) -> Result<RoomId, ApiError> {
    RoomId::new(room_id).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.into_iter().map(Into::into).collect())
}

/// Create a room with a fresh id
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    let room_id = state
        .create_room_usecase
        .execute(request.name, request.password)
        .await;
    tracing::info!("Room '{}' created via HTTP", room_id);
    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            id: room_id.into_string(),
        }),
    )
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummaryDto>, ApiError> {
    let room_id = parse_room_id(room_id)?;
    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(summary) => Ok(Json(summary.into())),
        Err(GetRoomDetailError::RoomNotFound) => Err(room_not_found()),
    }
}

/// Get chat history of a room
pub async fn get_chat_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
    let room_id = parse_room_id(room_id)?;
    let messages = state
        .get_chat_history_usecase
        .execute(&room_id, query.limit, query.since.as_deref())
        .await
        .map_err(|GetChatHistoryError::RoomNotFound| room_not_found())?;

    Ok(Json(ChatHistoryResponse {
        messages: messages.into_iter().map(ChatMessageDto::from).collect(),
    }))
}

/// Check a room password before joining
///
/// Unknown rooms never validate.
pub async fn check_room_password(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<PasswordCheckRequest>,
) -> Json<PasswordCheckResponse> {
    let valid = match RoomId::new(room_id) {
        Ok(room_id) => state
            .check_room_password_usecase
            .execute(&room_id, request.password.as_deref())
            .await
            .unwrap_or(false),
        Err(_) => false,
    };
    Json(PasswordCheckResponse { valid })
}
