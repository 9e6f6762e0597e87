//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## ルーム単位の直列化
//!
//! 「読んでから書く」操作（バズ登録・回答判定・名簿の追加削除など）は、
//! 実装側でルームごとの排他区間の中で完結させる必要があります。
//! そのため Room を取り出して UseCase 側で変更するのではなく、操作ごとのメソッドを提供します。
//! 戻り値のスナップショットも同じ排他区間の中で作られます。
//! ホスト操作は `caller` を受け取り、権限の確認と変更を同じ排他区間で行います。
//! 権限がなければ `RepositoryError::NotHost` を返し、ルームは変更しません。

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{
    AnswerResult, ChatMessage, ClientId, GameConfig, PlayerList, RepositoryError, Role, Room,
    RoomId, RoomSnapshot, RoomSummary, Timestamp,
};

/// ルーム参加リクエスト
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub client_id: ClientId,
    pub role: Role,
    pub name: Option<String>,
    pub password: Option<String>,
    pub joined_at: Timestamp,
}

/// ルーム参加の結果
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// 参加によってルームが新規作成されたか
    pub created: bool,
    pub snapshot: RoomSnapshot,
}

/// 名簿からの退出結果
#[derive(Debug, Clone)]
pub struct Departure {
    /// 空いた役割（名簿にいなかった場合は None）
    pub vacated: Option<Role>,
    /// 退出前の表示名
    pub display_name: String,
    pub players: PlayerList,
    pub is_empty: bool,
}

/// Room Repository trait（RoomStore）
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ID を生成してルームを作成
    async fn create_room(
        &self,
        name: Option<String>,
        password: Option<String>,
        created_at: Timestamp,
    ) -> RoomId;

    /// 指定 ID のルームに参加する。存在しなければその ID で作成する
    async fn join_or_create(&self, request: JoinRequest) -> Result<JoinOutcome, RepositoryError>;

    /// Room のコピーを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    async fn exists(&self, room_id: &RoomId) -> bool;

    /// ルームを削除し、存在していたかを返す
    async fn delete_room(&self, room_id: &RoomId) -> bool;

    /// ルームが空の場合のみ削除する
    async fn delete_if_empty(&self, room_id: &RoomId) -> bool;

    /// パスワード確認。存在しないルームは false
    async fn check_password(&self, room_id: &RoomId, password: Option<&str>) -> bool;

    async fn list_summaries(&self) -> Vec<RoomSummary>;

    async fn room_ids(&self) -> Vec<RoomId>;

    async fn remove_connection(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<Departure, RepositoryError>;

    async fn player_list(&self, room_id: &RoomId) -> Result<PlayerList, RepositoryError>;

    async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RepositoryError>;

    async fn display_name(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<String, RepositoryError>;

    /// 設定をマージし、マージ後の設定を返す
    async fn update_config(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        patch: Map<String, Value>,
    ) -> Result<GameConfig, RepositoryError>;

    /// ゲームを開始し、ブザーを受付可能にする
    async fn start_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError>;

    async fn pause_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError>;

    async fn end_game(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
    ) -> Result<RoomSnapshot, RepositoryError>;

    async fn set_current_song(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        song: Option<Value>,
    ) -> Result<RoomSnapshot, RepositoryError>;

    /// バズを登録。受理されたかを返す
    async fn register_buzz(
        &self,
        room_id: &RoomId,
        player_id: &ClientId,
        at: Timestamp,
    ) -> Result<bool, RepositoryError>;

    /// 回答判定。バズがなければ Ok(None)
    async fn validate_answer(
        &self,
        room_id: &RoomId,
        caller: &ClientId,
        is_correct: bool,
    ) -> Result<Option<(AnswerResult, RoomSnapshot)>, RepositoryError>;

    /// `created_before` より前に作られた空のルームを削除し、その ID を返す
    async fn cleanup_empty_rooms(&self, created_before: Timestamp) -> Vec<RoomId>;
}

/// Chat Repository trait（ChatStore）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 参加者のメッセージを追加
    async fn append(
        &self,
        room_id: &RoomId,
        sender_id: &ClientId,
        sender_name: &str,
        content: &str,
        role: Role,
        at: Timestamp,
    ) -> ChatMessage;

    /// システムメッセージを追加
    async fn append_system(&self, room_id: &RoomId, content: &str, at: Timestamp) -> ChatMessage;

    /// 直近 `count` 件を古い順に返す。未知のルームは空
    async fn history(&self, room_id: &RoomId, count: usize) -> Vec<ChatMessage>;

    /// `timestamp` より新しいメッセージを返す。解釈できない場合は直近 20 件
    async fn since(&self, room_id: &RoomId, timestamp: &str) -> Vec<ChatMessage>;

    async fn delete_room(&self, room_id: &RoomId) -> bool;

    /// アクティブでないルームの履歴を削除し、削除したルーム数を返す
    async fn cleanup(&self, active_room_ids: &[RoomId]) -> usize;
}
