//! Room エンティティ
//!
//! 1 つのゲームセッションを表す集約です。参加者の名簿、ホスト、
//! ゲーム状態とブザー状態の 2 つの状態機械、ゲーム設定を保持します。
//!
//! ## 状態機械
//!
//! ```text
//! game:   waiting --start--> playing --pause--> paused --start--> playing
//!         playing/paused --end--> ended
//! buzzer: inactive --reset--> active --buzz--> buzzed --reset--> active
//! ```
//!
//! 接続ハンドル自体は ConnectionRegistry が所有し、Room は client_id で参照します。
//! Room 自体には排他制御がないため、Repository がルーム単位のロックの内側でのみ変更します。

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::{BuzzerState, ClientId, GameConfig, GameState, Role, RoomId, Timestamp};

/// 名簿上のプレイヤー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub score: u32,
    pub joined_at: Timestamp,
}

/// 外部に公開するプレイヤー情報（名前とスコア）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub score: u32,
}

/// player_id → {name, score}
pub type PlayerList = BTreeMap<ClientId, PlayerSummary>;

/// ルーム一覧用の要約
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub has_password: bool,
    pub player_count: usize,
    pub game_state: GameState,
    pub created_at: Timestamp,
}

/// 参加直後のクライアントに送るルーム全体のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub summary: RoomSummary,
    pub buzzer_state: BuzzerState,
    pub current_buzzer: Option<ClientId>,
    pub buzzer_timestamp: Option<Timestamp>,
    pub players: PlayerList,
    pub config: GameConfig,
    pub current_song: Option<Value>,
}

/// 回答判定の結果
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub player_id: ClientId,
    pub is_correct: bool,
    pub scores: PlayerList,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    password: Option<String>,
    pub host_id: Option<ClientId>,
    pub players: BTreeMap<ClientId, Player>,
    pub spectators: BTreeMap<ClientId, Timestamp>,
    pub game_state: GameState,
    pub buzzer_state: BuzzerState,
    pub current_buzzer: Option<ClientId>,
    pub buzzer_timestamp: Option<Timestamp>,
    pub config: GameConfig,
    pub current_song: Option<Value>,
    pub created_at: Timestamp,
}

impl Room {
    /// 新しいルームを作成
    ///
    /// 名前を省略した場合は `Room-<ID 先頭 6 文字>` になります。空のパスワードは「パスワードなし」と同じ扱いです。
    pub fn new(
        id: RoomId,
        name: Option<String>,
        password: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Room-{}", id.as_str().chars().take(6).collect::<String>()));
        Self {
            id,
            name,
            password: password.filter(|p| !p.is_empty()),
            host_id: None,
            players: BTreeMap::new(),
            spectators: BTreeMap::new(),
            game_state: GameState::default(),
            buzzer_state: BuzzerState::default(),
            current_buzzer: None,
            buzzer_timestamp: None,
            config: GameConfig::default(),
            current_song: None,
            created_at,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// パスワードのないルームは常に通過する
    pub fn check_password(&self, candidate: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(password) => candidate == Some(password.as_str()),
        }
    }

    // ========================================
    // 名簿
    // ========================================

    /// ホストを設定（既存のホストは置き換えられる）
    pub fn set_host(&mut self, host_id: ClientId) {
        self.host_id = Some(host_id);
    }

    /// プレイヤーを追加（upsert）
    ///
    /// 既に名簿にいる場合は名前と接続時刻だけを更新し、スコアは保持します。
    pub fn add_player(&mut self, player_id: ClientId, name: Option<String>, joined_at: Timestamp) {
        let name = name.unwrap_or_else(|| player_id.as_str().to_string());
        self.players
            .entry(player_id)
            .and_modify(|player| {
                player.name = name.clone();
                player.joined_at = joined_at;
            })
            .or_insert(Player {
                name,
                score: 0,
                joined_at,
            });
    }

    pub fn add_spectator(&mut self, spectator_id: ClientId, joined_at: Timestamp) {
        self.spectators.insert(spectator_id, joined_at);
    }

    /// 指定 ID を host → players → spectators の順に探して削除し、空いた役割を返す
    pub fn remove_connection(&mut self, client_id: &ClientId) -> Option<Role> {
        if self.host_id.as_ref() == Some(client_id) {
            self.host_id = None;
            return Some(Role::Host);
        }
        if self.players.remove(client_id).is_some() {
            return Some(Role::Player);
        }
        if self.spectators.remove(client_id).is_some() {
            return Some(Role::Spectator);
        }
        None
    }

    /// 表示名（名簿にいない場合は client_id）
    pub fn display_name(&self, client_id: &ClientId) -> String {
        self.players
            .get(client_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| client_id.as_str().to_string())
    }

    /// ホストが未設定なら誰でも、設定済みならホストのみがホスト操作を行える
    pub fn may_control(&self, client_id: &ClientId) -> bool {
        match &self.host_id {
            None => true,
            Some(host_id) => host_id == client_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host_id.is_none() && self.players.is_empty() && self.spectators.is_empty()
    }

    // ========================================
    // ゲーム状態
    // ========================================

    pub fn update_config(&mut self, patch: Map<String, Value>) -> Vec<String> {
        self.config.merge(patch)
    }

    pub fn set_current_song(&mut self, song: Option<Value>) {
        self.current_song = song;
    }

    /// ゲームを開始（再開）する。ブザーは inactive に戻る
    pub fn start(&mut self) {
        self.game_state = GameState::Playing;
        self.deactivate_buzzer();
    }

    /// ゲームを一時停止する。ブザーには触れない
    pub fn pause(&mut self) {
        self.game_state = GameState::Paused;
    }

    /// ゲームを終了する。ブザーは inactive に戻る
    pub fn end(&mut self) {
        self.game_state = GameState::Ended;
        self.deactivate_buzzer();
    }

    fn deactivate_buzzer(&mut self) {
        self.buzzer_state = BuzzerState::Inactive;
        self.current_buzzer = None;
        self.buzzer_timestamp = None;
    }

    /// ブザーを受付可能な状態に戻す（いつでも呼べる）
    pub fn reset_buzzer(&mut self) {
        self.buzzer_state = BuzzerState::Active;
        self.current_buzzer = None;
        self.buzzer_timestamp = None;
    }

    /// バズを登録する
    ///
    /// ゲームが playing かつブザーが active で、名簿にいるプレイヤーからのバズのみ受理します。
    /// 受理後はリセットされるまで他のバズをすべて拒否します。
    pub fn register_buzz(&mut self, player_id: &ClientId, at: Timestamp) -> bool {
        if self.game_state != GameState::Playing || self.buzzer_state != BuzzerState::Active {
            return false;
        }
        if !self.players.contains_key(player_id) {
            return false;
        }
        self.buzzer_state = BuzzerState::Buzzed;
        self.current_buzzer = Some(player_id.clone());
        self.buzzer_timestamp = Some(at);
        true
    }

    /// バズしたプレイヤーの回答を判定する
    ///
    /// ブザーが buzzed でなければ `None`。正解かつプレイヤーがまだ名簿にいればスコアを 1 加算し、
    /// ブザーをリセットしてから結果を返します。
    pub fn validate_answer(&mut self, is_correct: bool) -> Option<AnswerResult> {
        if self.buzzer_state != BuzzerState::Buzzed {
            return None;
        }
        let player_id = self.current_buzzer.clone()?;
        if is_correct && let Some(player) = self.players.get_mut(&player_id) {
            player.score = player.score.saturating_add(1);
        }
        let result = AnswerResult {
            player_id,
            is_correct,
            scores: self.player_list(),
        };
        self.reset_buzzer();
        Some(result)
    }

    // ========================================
    // 読み取りビュー
    // ========================================

    pub fn player_list(&self) -> PlayerList {
        self.players
            .iter()
            .map(|(id, player)| {
                (
                    id.clone(),
                    PlayerSummary {
                        name: player.name.clone(),
                        score: player.score,
                    },
                )
            })
            .collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            has_password: self.has_password(),
            player_count: self.players.len(),
            game_state: self.game_state,
            created_at: self.created_at,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            summary: self.summary(),
            buzzer_state: self.buzzer_state,
            current_buzzer: self.current_buzzer.clone(),
            buzzer_timestamp: self.buzzer_timestamp,
            players: self.player_list(),
            config: self.config.clone(),
            current_song: self.current_song.clone(),
        }
    }
}
