//! Server state shared by all handlers.

use std::sync::Arc;

use crate::usecase::{
    CheckRoomPasswordUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
    DisconnectParticipantUseCase, DispatchMessageUseCase, GetChatHistoryUseCase,
    GetRoomDetailUseCase, GetRoomsUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// DispatchMessageUseCase（受信メッセージ振り分けのユースケース）
    pub dispatch_message_usecase: Arc<DispatchMessageUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    pub check_room_password_usecase: Arc<CheckRoomPasswordUseCase>,
    /// 接続ごとの送信キューの容量
    pub outbound_capacity: usize,
}
