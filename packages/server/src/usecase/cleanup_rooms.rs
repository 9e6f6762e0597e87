//! UseCase: 空ルームと孤立したチャット履歴の定期掃除
//!
//! 切断処理で消し損ねたルームや履歴を拾うための掃除です。
//! 作られたばかりの空ルーム（`POST /api/rooms` の直後など）は TTL が過ぎるまで残します。

use std::{sync::Arc, time::Duration};

use buzzquiz_shared::time::Clock;

use crate::domain::{ChatRepository, RoomRepository, Timestamp};

use super::RoomLifecycle;

/// 掃除の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub rooms_removed: usize,
    pub histories_removed: usize,
}

/// 定期掃除のユースケース
pub struct CleanupRoomsUseCase {
    room_repository: Arc<dyn RoomRepository>,
    chat_repository: Arc<dyn ChatRepository>,
    lifecycle: Arc<RoomLifecycle>,
    clock: Arc<dyn Clock>,
    empty_room_ttl: Duration,
}

impl CleanupRoomsUseCase {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        chat_repository: Arc<dyn ChatRepository>,
        lifecycle: Arc<RoomLifecycle>,
        clock: Arc<dyn Clock>,
        empty_room_ttl: Duration,
    ) -> Self {
        Self {
            room_repository,
            chat_repository,
            lifecycle,
            clock,
            empty_room_ttl,
        }
    }

    pub async fn execute(&self) -> CleanupReport {
        let ttl_millis = i64::try_from(self.empty_room_ttl.as_millis()).unwrap_or(i64::MAX);
        let created_before = Timestamp::new(self.clock.now_jst_millis().saturating_sub(ttl_millis));

        // 掃除中に作られたルームの参加メッセージを消さないよう、参加は待たせる
        let teardown = self.lifecycle.teardown().await;
        let removed = self
            .room_repository
            .cleanup_empty_rooms(created_before)
            .await;

        let active = self.room_repository.room_ids().await;
        let histories_removed = self.chat_repository.cleanup(&active).await;
        drop(teardown);

        let report = CleanupReport {
            rooms_removed: removed.len(),
            histories_removed,
        };
        if report != CleanupReport::default() {
            tracing::info!(
                "Cleanup removed {} room(s) and {} chat histories",
                report.rooms_removed,
                report.histories_removed
            );
        }
        report
    }
}
