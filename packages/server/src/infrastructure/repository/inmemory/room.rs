//! InMemory Room Repository 実装
//!
//! ゲーム種別ごとに 1 インスタンス生成され、そのゲーム種別の全ルームを保持します。
//! HashMap をインメモリ DB として使用します。
//!
//! ## ロック方針
//!
//! ルームマップ全体を 1 つの Mutex で保護します（粗粒度ロック）。
//! Coordinator は `lock()` で得た `RoomTable` を保持したまま
//! 「検査 → 更新 → ブロードキャスト」を行うため、同じルームへの操作は必ず直列化されます。

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{ConnectionId, GameId, Room};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository<S> {
    rooms: Mutex<HashMap<GameId, Room<S>>>,
}

/// ロック中のルームマップ
///
/// 破棄されるとロックが解放されます。
pub struct RoomTable<'a, S> {
    rooms: MutexGuard<'a, HashMap<GameId, Room<S>>>,
}

impl<S> Default for InMemoryRoomRepository<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InMemoryRoomRepository<S> {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// ルームマップをロックして取得
    pub async fn lock(&self) -> RoomTable<'_, S> {
        RoomTable {
            rooms: self.rooms.lock().await,
        }
    }

    /// ルームを保存（既存のルームは上書き）
    pub async fn set_room(&self, room: Room<S>) {
        self.lock().await.upsert(room);
    }

    /// ルームに購読中の接続を取得
    pub async fn get_connections(&self, game_id: &GameId) -> Vec<ConnectionId> {
        self.lock()
            .await
            .get(game_id)
            .map(Room::connection_ids)
            .unwrap_or_default()
    }

    /// ルームを削除
    pub async fn remove_room(&self, game_id: &GameId) -> Option<Room<S>> {
        self.lock().await.remove(game_id)
    }

    /// ルーム数を取得
    pub async fn count_rooms(&self) -> usize {
        self.lock().await.len()
    }

    /// 全ルームの ID を取得
    pub async fn game_ids(&self) -> Vec<GameId> {
        self.lock().await.iter().map(|room| room.game_id.clone()).collect()
    }
}

impl<S: Clone> InMemoryRoomRepository<S> {
    /// ルームを取得（スナップショット）
    pub async fn get_room(&self, game_id: &GameId) -> Option<Room<S>> {
        self.lock().await.get(game_id).cloned()
    }
}

impl<S> RoomTable<'_, S> {
    pub fn get(&self, game_id: &GameId) -> Option<&Room<S>> {
        self.rooms.get(game_id)
    }

    pub fn get_mut(&mut self, game_id: &GameId) -> Option<&mut Room<S>> {
        self.rooms.get_mut(game_id)
    }

    /// ルームが無ければ `create` で生成して挿入する
    ///
    /// 既存のルームは決してリセットしない（重複した join の競合対策）。
    /// 戻り値の bool は新規作成されたかどうか。
    pub fn insert_if_absent(
        &mut self,
        game_id: &GameId,
        create: impl FnOnce() -> Room<S>,
    ) -> (&mut Room<S>, bool) {
        let created = !self.rooms.contains_key(game_id);
        let room = self.rooms.entry(game_id.clone()).or_insert_with(create);
        (room, created)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room<S>> {
        self.rooms.values()
    }

    pub fn upsert(&mut self, room: Room<S>) {
        self.rooms.insert(room.game_id.clone(), room);
    }

    pub fn remove(&mut self, game_id: &GameId) -> Option<Room<S>> {
        self.rooms.remove(game_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Player, PlayerId, Timestamp};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository の基本的な CRUD 操作
    // - insert_if_absent が既存ルームを上書きしないこと
    //
    // 【なぜこのテストが必要か】
    // - 重複した join メッセージが競合しても、既存のルーム状態が失われてはならない
    // - ルーム削除時に接続集合も一緒に消える必要がある
    // ========================================

    fn gid(value: &str) -> GameId {
        GameId::new(value.to_string()).unwrap()
    }

    fn create_test_room(game_id: &str) -> Room<Vec<String>> {
        Room::new(gid(game_id), 2, Timestamp::new(1000), vec!["Tisch".to_string()])
    }

    #[tokio::test]
    async fn test_set_and_get_room() {
        // テスト項目: 保存したルームを取得できる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        repo.set_room(create_test_room("game-1")).await;
        let room = repo.get_room(&gid("game-1")).await;

        // then (期待する結果):
        assert!(room.is_some());
        assert_eq!(room.unwrap().state, vec!["Tisch".to_string()]);
        assert_eq!(repo.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_existing_room() {
        // テスト項目: 既存ルームに対する insert_if_absent は状態をリセットしない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        {
            let mut table = repo.lock().await;
            let (room, created) = table.insert_if_absent(&gid("game-1"), || create_test_room("game-1"));
            room.add_player(Player::new(PlayerId::new("alice".into()).unwrap(), "Alice"));
            assert!(created);
        }

        // when (操作):
        let created_again = {
            let mut table = repo.lock().await;
            let (_, created) = table.insert_if_absent(&gid("game-1"), || create_test_room("game-1"));
            created
        };

        // then (期待する結果):
        assert!(!created_again);
        let room = repo.get_room(&gid("game-1")).await.unwrap();
        assert_eq!(room.players.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_room_drops_connections() {
        // テスト項目: ルーム削除で接続集合も一緒に削除される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let mut room = create_test_room("game-1");
        room.subscribe(ConnectionId::generate(), PlayerId::new("alice".into()).unwrap());
        repo.set_room(room).await;
        assert_eq!(repo.get_connections(&gid("game-1")).await.len(), 1);

        // when (操作):
        let removed = repo.remove_room(&gid("game-1")).await;

        // then (期待する結果):
        assert!(removed.is_some());
        assert!(repo.get_connections(&gid("game-1")).await.is_empty());
        assert!(repo.get_room(&gid("game-1")).await.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_room_is_none() {
        // テスト項目: 存在しないルームの取得は None を返す
        // given (前提条件):
        let repo: InMemoryRoomRepository<Vec<String>> = InMemoryRoomRepository::new();

        // when (操作):
        let room = repo.get_room(&gid("missing")).await;

        // then (期待する結果):
        assert!(room.is_none());
        assert!(repo.game_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_listing_sees_every_room() {
        // テスト項目: ルーム一覧はロック中のテーブルから全ルームを返す
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.set_room(create_test_room("game-1")).await;
        repo.set_room(create_test_room("game-2")).await;

        // when (操作):
        let mut ids = repo.game_ids().await;
        ids.sort();
        let words: usize = repo.lock().await.iter().map(|room| room.state.len()).sum();

        // then (期待する結果):
        assert_eq!(ids, vec![gid("game-1"), gid("game-2")]);
        assert_eq!(words, 2);
        assert_eq!(repo.count_rooms().await, 2);
    }
}
