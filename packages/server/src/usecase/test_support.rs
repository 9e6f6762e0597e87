//! UseCase テスト用の共通セットアップ

use std::sync::Arc;

use buzzquiz_shared::time::ManualClock;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, Role, RoomId},
    infrastructure::{
        connection_registry::WebSocketConnectionRegistry,
        repository::{InMemoryChatRepository, InMemoryRoomRepository},
    },
};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchMessageUseCase,
    GameControlUseCase, JoinParams, RoomLifecycle, SendChatMessageUseCase, SessionContext,
};

// 2023-01-01 00:00:00 JST
pub const START_MILLIS: i64 = 1672498800000;

pub struct Fixture {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub chats: Arc<InMemoryChatRepository>,
    pub registry: Arc<WebSocketConnectionRegistry>,
    pub lifecycle: Arc<RoomLifecycle>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(InMemoryRoomRepository::new()),
            chats: Arc::new(InMemoryChatRepository::default()),
            registry: Arc::new(WebSocketConnectionRegistry::default()),
            lifecycle: Arc::new(RoomLifecycle::new()),
            clock: Arc::new(ManualClock::new(START_MILLIS)),
        }
    }

    pub fn connect_usecase(&self) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            self.rooms.clone(),
            self.chats.clone(),
            self.registry.clone(),
            self.lifecycle.clone(),
            self.clock.clone(),
            30,
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            self.rooms.clone(),
            self.chats.clone(),
            self.registry.clone(),
            self.lifecycle.clone(),
            self.clock.clone(),
        )
    }

    pub fn chat_usecase(&self) -> SendChatMessageUseCase {
        SendChatMessageUseCase::new(
            self.rooms.clone(),
            self.chats.clone(),
            self.registry.clone(),
            self.clock.clone(),
        )
    }

    pub fn game_usecase(&self) -> GameControlUseCase {
        GameControlUseCase::new(
            self.rooms.clone(),
            self.chats.clone(),
            self.registry.clone(),
            self.clock.clone(),
        )
    }

    pub fn dispatch_usecase(&self) -> DispatchMessageUseCase {
        DispatchMessageUseCase::new(
            self.rooms.clone(),
            self.registry.clone(),
            Arc::new(self.chat_usecase()),
            Arc::new(self.game_usecase()),
        )
    }

    pub async fn join(
        &self,
        room_id: &str,
        client_id: &str,
        role: Role,
    ) -> (SessionContext, mpsc::Receiver<String>) {
        self.join_with(join_params(room_id, client_id, role)).await
    }

    pub async fn join_named(
        &self,
        room_id: &str,
        client_id: &str,
        name: &str,
        role: Role,
    ) -> (SessionContext, mpsc::Receiver<String>) {
        let mut params = join_params(room_id, client_id, role);
        params.name = Some(name.to_string());
        self.join_with(params).await
    }

    async fn join_with(&self, params: JoinParams) -> (SessionContext, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(64);
        let session = self.connect_usecase().execute(params, tx).await.unwrap();
        self.clock.advance(1);
        (session, rx)
    }
}

pub fn join_params(room_id: &str, client_id: &str, role: Role) -> JoinParams {
    JoinParams {
        room_id: RoomId::new(room_id.to_string()).unwrap(),
        client_id: ClientId::new(client_id.to_string()).unwrap(),
        role,
        name: None,
        password: None,
    }
}

/// 受信済みのメッセージをすべて取り出す。JSON でないものは文字列として返す
pub fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
    let mut received = Vec::new();
    while let Ok(text) = rx.try_recv() {
        received.push(serde_json::from_str(&text).unwrap_or(Value::String(text)));
    }
    received
}
