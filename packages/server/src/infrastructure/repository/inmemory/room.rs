//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `HashMap<RoomId, Arc<Mutex<Room>>>` をインメモリ DB として使用します。
//!
//! ## ロックの順序
//!
//! - ルームごとに 1 つの `Mutex` があり、ルームの状態を変更する操作はすべてその中で完結します。
//! - ルームの作成・削除は外側の map のロックを取ってからルームのロックを取ります（map → room の順）。
//! - ルームのロックを保持したまま map のロックを取ることはありません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::domain::{
    AnswerResult, ClientId, Departure, GameConfig, JoinOutcome, JoinRequest, PlayerList,
    RepositoryError, Role, Room, RoomId, RoomRepository, RoomSnapshot, RoomSummary, Timestamp,
};

type RoomHandle = Arc<Mutex<Room>>;

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn room_handle(&self, room_id: &RoomId) -> Result<RoomHandle, RepositoryError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))
    }

    /// ルームのロックを取って `f` を実行する
    async fn with_room<R>(
        &self,
        room_id: &RoomId,
        f: impl FnOnce(&mut Room) -> R + Send,
    ) -> Result<R, RepositoryError> {
        let handle = self.room_handle(room_id).await?;
        let mut room = handle.lock().await;
        Ok(f(&mut room))
    }

    /// ホスト操作。権限の確認と `f` の実行を同じロックの中で行う
    async fn with_controlled_room<R>(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        f: impl FnOnce(&mut Room) -> R + Send,
    ) -> Result<R, RepositoryError> {
        self.with_room(room_id, move |room| room.may_control(caller).then(|| f(room)))
            .await?
            .ok_or_else(|| RepositoryError::NotHost(caller.as_str().to_string()))
    }

    async fn handles(&self) -> Vec<RoomHandle> {
        let rooms = self.rooms.lock().await;
        rooms.values().cloned().collect()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(
        &self,
        name: Option<String>,
        password: Option<String>,
        created_at: Timestamp,
    ) -> RoomId {
        let mut rooms = self.rooms.lock().await;
        let mut room_id = RoomId::generate();
        while rooms.contains_key(&room_id) {
            room_id = RoomId::generate();
        }
        let room = Room::new(room_id.clone(), name, password, created_at);
        rooms.insert(room_id.clone(), Arc::new(Mutex::new(room)));
        tracing::info!("Room '{}' created", room_id);
        room_id
    }

    async fn join_or_create(&self, request: JoinRequest) -> Result<JoinOutcome, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let (handle, created) = match rooms.get(&request.room_id) {
            Some(handle) => (handle.clone(), false),
            None => {
                let room = Room::new(request.room_id.clone(), None, None, request.joined_at);
                let handle = Arc::new(Mutex::new(room));
                rooms.insert(request.room_id.clone(), handle.clone());
                tracing::info!("Room '{}' created on first join", request.room_id);
                (handle, true)
            }
        };

        // map のロックを保持したままルームを変更し、空ルームの削除と競合しないようにする
        let mut room = handle.lock().await;
        if !created && !room.check_password(request.password.as_deref()) {
            return Err(RepositoryError::InvalidPassword(
                request.room_id.as_str().to_string(),
            ));
        }
        match request.role {
            Role::Host => room.set_host(request.client_id),
            Role::Player => room.add_player(request.client_id, request.name, request.joined_at),
            Role::Spectator => room.add_spectator(request.client_id, request.joined_at),
        }
        Ok(JoinOutcome {
            created,
            snapshot: room.snapshot(),
        })
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        self.with_room(room_id, |room| room.clone()).await
    }

    async fn exists(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }

    async fn delete_room(&self, room_id: &RoomId) -> bool {
        let removed = self.rooms.lock().await.remove(room_id).is_some();
        if removed {
            tracing::info!("Room '{}' deleted", room_id);
        }
        removed
    }

    async fn delete_if_empty(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(handle) = rooms.get(room_id).cloned() else {
            return false;
        };
        let is_empty = handle.lock().await.is_empty();
        if is_empty {
            rooms.remove(room_id);
            tracing::info!("Room '{}' deleted (empty)", room_id);
        }
        is_empty
    }

    async fn check_password(&self, room_id: &RoomId, password: Option<&str>) -> bool {
        self.with_room(room_id, |room| room.check_password(password))
            .await
            .unwrap_or(false)
    }

    async fn list_summaries(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for handle in self.handles().await {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries
    }

    async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    async fn remove_connection(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<Departure, RepositoryError> {
        self.with_room(room_id, |room| {
            let display_name = room.display_name(client_id);
            let vacated = room.remove_connection(client_id);
            Departure {
                vacated,
                display_name,
                players: room.player_list(),
                is_empty: room.is_empty(),
            }
        })
        .await
    }

    async fn player_list(&self, room_id: &RoomId) -> Result<PlayerList, RepositoryError> {
        self.with_room(room_id, |room| room.player_list()).await
    }

    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RepositoryError> {
        self.with_room(room_id, |room| room.snapshot()).await
    }

    async fn display_name(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<String, RepositoryError> {
        self.with_room(room_id, |room| room.display_name(client_id))
            .await
    }

    async fn update_config(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        patch: Map<String, Value>,
    ) -> Result<GameConfig, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            let rejected = room.update_config(patch);
            if !rejected.is_empty() {
                tracing::warn!(
                    "Ignored config keys with invalid values in room '{}': {:?}",
                    room.id,
                    rejected
                );
            }
            room.config.clone()
        })
        .await
    }

    async fn start_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            room.start();
            room.reset_buzzer();
            room.snapshot()
        })
        .await
    }

    async fn pause_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            room.pause();
            room.snapshot()
        })
        .await
    }

    async fn end_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            room.end();
            room.snapshot()
        })
        .await
    }

    async fn set_current_song(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        song: Option<Value>,
    ) -> Result<RoomSnapshot, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            room.set_current_song(song);
            room.snapshot()
        })
        .await
    }

    async fn register_buzz(
        &self,
        room_id: &RoomId,
        player_id: &ClientId,
        at: Timestamp,
    ) -> Result<bool, RepositoryError> {
        self.with_room(room_id, |room| room.register_buzz(player_id, at))
            .await
    }

    async fn validate_answer(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        is_correct: bool,
    ) -> Result<Option<(AnswerResult, RoomSnapshot)>, RepositoryError> {
        self.with_controlled_room(room_id, caller, |room| {
            room.validate_answer(is_correct)
                .map(|result| (result, room.snapshot()))
        })
        .await
    }

    async fn cleanup_empty_rooms(&self, created_before: Timestamp) -> Vec<RoomId> {
        let mut rooms = self.rooms.lock().await;
        let mut stale = Vec::new();
        for (room_id, handle) in rooms.iter() {
            let room = handle.lock().await;
            if room.is_empty() && room.created_at < created_before {
                stale.push(room_id.clone());
            }
        }
        for room_id in &stale {
            rooms.remove(room_id);
        }
        if !stale.is_empty() {
            tracing::info!("Swept {} empty room(s)", stale.len());
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuzzerState, GameState};
    use serde_json::json;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルームの作成・参加・削除
    // - パスワード確認
    // - ルーム単位の排他区間によるバズの排他性
    //
    // 【なぜこのテストが必要か】
    // - UseCase 層は Repository の操作が原子的であることを前提にしている
    // - 同時に届いたバズのうち 1 つだけが受理されることを保証する必要がある
    // ========================================

    fn client(value: &str) -> ClientId {
        ClientId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn join_request(room_id: &str, client_id: &str, role: Role) -> JoinRequest {
        JoinRequest {
            room_id: room(room_id),
            client_id: client(client_id),
            role,
            name: None,
            password: None,
            joined_at: Timestamp::new(1000),
        }
    }

    #[tokio::test]
    async fn test_create_room_generates_unique_ids() {
        // テスト項目: create_room が一意の ID でルームを作成する
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let first = repo
            .create_room(Some("Quiz".to_string()), None, Timestamp::new(1))
            .await;
        let second = repo.create_room(None, None, Timestamp::new(2)).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(repo.exists(&first).await);
        assert_eq!(repo.get_room(&first).await.unwrap().name, "Quiz");
        assert_eq!(repo.list_summaries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_join_or_create_creates_unknown_room_with_requested_id() {
        // テスト項目: 未知のルーム ID への参加はその ID でルームを作成する
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let first = repo
            .join_or_create(join_request("r2", "alice", Role::Player))
            .await
            .unwrap();
        let second = repo
            .join_or_create(join_request("r2", "bob", Role::Player))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.snapshot.summary.id, room("r2"));
        assert_eq!(second.snapshot.players.len(), 2);
    }

    #[tokio::test]
    async fn test_join_assigns_roles() {
        // テスト項目: 役割に応じてホスト・プレイヤー・観戦者に登録される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        repo.join_or_create(join_request("r", "h", Role::Host))
            .await
            .unwrap();
        repo.join_or_create(join_request("r", "p", Role::Player))
            .await
            .unwrap();
        repo.join_or_create(join_request("r", "s", Role::Spectator))
            .await
            .unwrap();

        // then (期待する結果):
        let snapshot = repo.get_room(&room("r")).await.unwrap();
        assert_eq!(snapshot.host_id, Some(client("h")));
        assert!(snapshot.players.contains_key(&client("p")));
        assert!(snapshot.spectators.contains_key(&client("s")));
    }

    #[tokio::test]
    async fn test_join_existing_room_checks_password() {
        // テスト項目: パスワード付きルームへの参加はパスワードが一致する場合のみ成功する
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room_id = repo
            .create_room(None, Some("secret".to_string()), Timestamp::new(1))
            .await;

        // when (操作):
        let mut wrong = join_request(room_id.as_str(), "alice", Role::Player);
        wrong.password = Some("nope".to_string());
        let rejected = repo.join_or_create(wrong).await;
        let mut right = join_request(room_id.as_str(), "alice", Role::Player);
        right.password = Some("secret".to_string());
        let accepted = repo.join_or_create(right).await;

        // then (期待する結果):
        assert_eq!(
            rejected.unwrap_err(),
            RepositoryError::InvalidPassword(room_id.as_str().to_string())
        );
        assert!(accepted.is_ok());
        assert!(repo.check_password(&room_id, Some("secret")).await);
        assert!(!repo.check_password(&room("missing"), None).await);
    }

    #[tokio::test]
    async fn test_remove_connection_and_delete_if_empty() {
        // テスト項目: 最後の参加者が抜けた時だけ delete_if_empty が削除する
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join_or_create(join_request("r", "alice", Role::Player))
            .await
            .unwrap();
        repo.join_or_create(join_request("r", "bob", Role::Player))
            .await
            .unwrap();

        // when (操作):
        let bob_left = repo.remove_connection(&room("r"), &client("bob")).await.unwrap();
        let kept = repo.delete_if_empty(&room("r")).await;
        let alice_left = repo
            .remove_connection(&room("r"), &client("alice"))
            .await
            .unwrap();
        let deleted = repo.delete_if_empty(&room("r")).await;

        // then (期待する結果):
        assert_eq!(bob_left.vacated, Some(Role::Player));
        assert!(!bob_left.is_empty);
        assert!(!kept);
        assert!(alice_left.is_empty);
        assert!(deleted);
        assert!(!repo.exists(&room("r")).await);
    }

    #[tokio::test]
    async fn test_operations_on_missing_room_fail() {
        // テスト項目: 存在しないルームへの操作は RoomNotFound になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let result = repo.start_game(&room("missing"), &client("alice")).await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RepositoryError::RoomNotFound("missing".to_string())
        );
        assert!(!repo.delete_room(&room("missing")).await);
    }

    #[tokio::test]
    async fn test_start_game_activates_buzzer() {
        // テスト項目: start_game で playing かつ active になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join_or_create(join_request("r", "alice", Role::Player))
            .await
            .unwrap();

        // when (操作):
        let snapshot = repo.start_game(&room("r"), &client("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.summary.game_state, GameState::Playing);
        assert_eq!(snapshot.buzzer_state, BuzzerState::Active);
    }

    #[tokio::test]
    async fn test_host_operations_check_caller_under_room_lock() {
        // テスト項目: ホストがいるルームでは、ホスト以外のホスト操作は NotHost になり状態は変わらない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join_or_create(join_request("r", "h", Role::Host))
            .await
            .unwrap();
        repo.join_or_create(join_request("r", "p1", Role::Player))
            .await
            .unwrap();

        // when (操作):
        let by_player = repo.start_game(&room("r"), &client("p1")).await;
        let song = repo
            .set_current_song(&room("r"), &client("p1"), Some(json!({"title": "So What"})))
            .await;
        let state_after_rejection = repo.snapshot(&room("r")).await.unwrap();
        let by_host = repo.start_game(&room("r"), &client("h")).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            by_player.unwrap_err(),
            RepositoryError::NotHost("p1".to_string())
        );
        assert_eq!(song.unwrap_err(), RepositoryError::NotHost("p1".to_string()));
        assert_eq!(state_after_rejection.summary.game_state, GameState::Waiting);
        assert_eq!(state_after_rejection.current_song, None);
        assert_eq!(by_host.summary.game_state, GameState::Playing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_buzzes_have_exactly_one_winner() {
        // テスト項目: 同時に届いた複数のバズのうち 1 つだけが受理される
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new());
        let players: Vec<String> = (0..16).map(|i| format!("p{i}")).collect();
        for player in &players {
            repo.join_or_create(join_request("r", player, Role::Player))
                .await
                .unwrap();
        }
        repo.start_game(&room("r"), &client("p0")).await.unwrap();

        // when (操作):
        let barrier = Arc::new(tokio::sync::Barrier::new(players.len()));
        let mut tasks = Vec::new();
        for player in players {
            let repo = repo.clone();
            let barrier = barrier.clone();
            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                repo.register_buzz(&room("r"), &client(&player), Timestamp::new(5))
                    .await
                    .unwrap()
            }));
        }
        let mut accepted = 0;
        for task in tasks {
            if task.await.unwrap() {
                accepted += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(accepted, 1);
        let snapshot = repo.snapshot(&room("r")).await.unwrap();
        assert_eq!(snapshot.buzzer_state, BuzzerState::Buzzed);
        assert!(snapshot.current_buzzer.is_some());
    }

    #[tokio::test]
    async fn test_validate_answer_returns_result_and_snapshot() {
        // テスト項目: 回答判定で結果とリセット後のスナップショットが返る
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join_or_create(join_request("r", "p1", Role::Player))
            .await
            .unwrap();
        repo.start_game(&room("r"), &client("p1")).await.unwrap();
        repo.register_buzz(&room("r"), &client("p1"), Timestamp::new(5))
            .await
            .unwrap();

        // when (操作):
        let (result, snapshot) = repo
            .validate_answer(&room("r"), &client("p1"), true)
            .await
            .unwrap()
            .unwrap();
        let second = repo
            .validate_answer(&room("r"), &client("p1"), true)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.scores[&client("p1")].score, 1);
        assert_eq!(snapshot.buzzer_state, BuzzerState::Active);
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_empty_rooms_respects_age() {
        // テスト項目: 古い空ルームだけが削除され、新しい空ルームと使用中のルームは残る
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let old_empty = repo.create_room(None, None, Timestamp::new(100)).await;
        let new_empty = repo.create_room(None, None, Timestamp::new(900)).await;
        repo.join_or_create(JoinRequest {
            joined_at: Timestamp::new(50),
            ..join_request("busy", "alice", Role::Player)
        })
        .await
        .unwrap();

        // when (操作):
        let removed = repo.cleanup_empty_rooms(Timestamp::new(500)).await;

        // then (期待する結果):
        assert_eq!(removed, vec![old_empty.clone()]);
        assert!(!repo.exists(&old_empty).await);
        assert!(repo.exists(&new_empty).await);
        assert!(repo.exists(&room("busy")).await);
    }
}
