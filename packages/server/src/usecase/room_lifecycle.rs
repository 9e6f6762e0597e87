//! ルームの自動作成とチャット履歴の削除を直列化するロック
//!
//! ルームとチャット履歴は別々のリポジトリにあるため、空ルームの削除と履歴の削除の間に
//! 同じ ID で参加があると、新しいルームの履歴を消してしまう。
//! 参加（ルームの解決と参加メッセージの追加）は共有ロック、
//! 削除（空ルームの削除と履歴の削除）は排他ロックの中で行う。

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct RoomLifecycle {
    lock: RwLock<()>,
}

impl RoomLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 参加処理中に保持する。参加同士は並行して進む
    pub async fn join(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// ルームと履歴を消す間だけ保持する
    pub async fn teardown(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}
