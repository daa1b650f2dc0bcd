//! エンティティ定義
//!
//! ## Room
//!
//! ゲーム種別に依存しない共通部分（ステータス、プレイヤー、ホスト、購読中の接続）を持ち、
//! ゲーム固有のデータは型パラメータ `S` として保持します。

use std::collections::BTreeMap;

use super::{
    error::RoomError,
    value_object::{ConnectionId, GameId, GameStatus, PlayerId, Timestamp},
};

/// A player seated in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub ready: bool,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            ready: false,
            is_host: false,
        }
    }

    /// Clear per-game progress, keeping identity and host flag.
    pub fn reset(&mut self) {
        self.score = 0;
        self.ready = false;
    }
}

/// Result of trying to seat a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAdmission {
    Added,
    AlreadyPresent,
    RoomFull,
}

/// What happened when a connection left a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Identity the connection had joined as
    pub player_id: PlayerId,
    /// Roster position the player held, if the player was removed
    pub removed_index: Option<usize>,
    /// New host, if the host left and someone was promoted
    pub promoted_host: Option<PlayerId>,
}

impl Departure {
    pub fn player_removed(&self) -> bool {
        self.removed_index.is_some()
    }
}

/// Authoritative in-memory state of one game instance.
#[derive(Debug, Clone)]
pub struct Room<S> {
    pub game_id: GameId,
    pub status: GameStatus,
    pub players: Vec<Player>,
    pub host_id: Option<PlayerId>,
    pub max_players: usize,
    /// Subscribed connections and the identity each one joined as
    pub connections: BTreeMap<ConnectionId, PlayerId>,
    /// Bumped on every restart; delayed transitions compare against it
    pub epoch: u64,
    pub created_at: Timestamp,
    pub state: S,
}

impl<S> Room<S> {
    pub fn new(game_id: GameId, max_players: usize, created_at: Timestamp, state: S) -> Self {
        Self {
            game_id,
            status: GameStatus::Waiting,
            players: Vec::new(),
            host_id: None,
            max_players: max_players.max(1),
            connections: BTreeMap::new(),
            epoch: 0,
            created_at,
            state,
        }
    }

    /// Subscribe a connection to this room.
    ///
    /// Returns `true` if the connection was not subscribed before.
    pub fn subscribe(&mut self, connection_id: ConnectionId, player_id: PlayerId) -> bool {
        self.connections.insert(connection_id, player_id).is_none()
    }

    /// Seat a player unless one with the same identity is already present.
    ///
    /// The first seated player becomes host when no host has been chosen.
    pub fn add_player(&mut self, mut player: Player) -> PlayerAdmission {
        if self.has_player(&player.id) {
            return PlayerAdmission::AlreadyPresent;
        }
        if self.players.len() >= self.max_players {
            return PlayerAdmission::RoomFull;
        }

        let becomes_host = match &self.host_id {
            None => true,
            Some(host_id) => host_id == &player.id,
        };
        if becomes_host {
            self.host_id = Some(player.id.clone());
        }
        player.is_host = becomes_host;
        self.players.push(player);
        PlayerAdmission::Added
    }

    /// Hand the host role to `player_id`.
    pub fn set_host(&mut self, player_id: &PlayerId) {
        for player in &mut self.players {
            player.is_host = &player.id == player_id;
        }
        self.host_id = Some(player_id.clone());
    }

    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == player_id)
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == player_id)
    }

    pub fn is_host(&self, player_id: &PlayerId) -> bool {
        self.host_id.as_ref() == Some(player_id)
    }

    /// Set the readiness flag. Returns `false` for an unknown player.
    pub fn mark_ready(&mut self, player_id: &PlayerId) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.ready = true;
                true
            }
            None => false,
        }
    }

    /// A solo room starts as soon as anyone is ready; otherwise at least two
    /// players must be seated and all of them ready.
    pub fn all_ready(&self) -> bool {
        if self.max_players == 1 {
            return self.players.iter().any(|p| p.ready);
        }
        self.players.len() >= 2 && self.players.iter().all(|p| p.ready)
    }

    pub fn begin(&mut self) -> Result<(), RoomError> {
        self.transition(GameStatus::Waiting, GameStatus::InProgress)
    }

    pub fn complete(&mut self) -> Result<(), RoomError> {
        self.transition(GameStatus::InProgress, GameStatus::Completed)
    }

    fn transition(&mut self, from: GameStatus, to: GameStatus) -> Result<(), RoomError> {
        if self.status != from {
            return Err(RoomError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Put the room back into `waiting` with zeroed scores.
    ///
    /// Connections, roster and host are kept. Game state is reset by the caller.
    pub fn reset_for_restart(&mut self) {
        self.status = GameStatus::Waiting;
        self.players.iter_mut().for_each(Player::reset);
        self.epoch += 1;
    }

    /// Unsubscribe a connection.
    ///
    /// The player is removed only when no other connection holds the same
    /// identity. Returns `None` if the connection was not subscribed.
    pub fn unsubscribe(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let player_id = self.connections.remove(connection_id)?;

        let still_connected = self.connections.values().any(|id| id == &player_id);
        if still_connected {
            return Some(Departure {
                player_id,
                removed_index: None,
                promoted_host: None,
            });
        }

        let Some(index) = self.players.iter().position(|p| p.id == player_id) else {
            // Spectators hold a connection but no seat.
            return Some(Departure {
                player_id,
                removed_index: None,
                promoted_host: None,
            });
        };
        self.players.remove(index);

        let mut promoted_host = None;
        if self.host_id.as_ref() == Some(&player_id) {
            self.host_id = None;
            if !self.players.is_empty() {
                let next = self.players[index % self.players.len()].id.clone();
                self.set_host(&next);
                promoted_host = Some(next);
            }
        }

        Some(Departure {
            player_id,
            removed_index: Some(index),
            promoted_host,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Player that follows `player_id` in roster order, wrapping around.
    pub fn next_player_after(&self, player_id: &PlayerId) -> Option<PlayerId> {
        let index = self.players.iter().position(|p| &p.id == player_id)?;
        let next = (index + 1) % self.players.len();
        Some(self.players[next].id.clone())
    }

    /// Highest score wins; ties go to whoever comes first in the roster.
    pub fn winner(&self) -> Option<&Player> {
        self.players.iter().fold(None, |best: Option<&Player>, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(value: &str) -> PlayerId {
        PlayerId::new(value.to_string()).unwrap()
    }

    fn create_test_room(max_players: usize) -> Room<()> {
        Room::new(
            GameId::new("game-1".to_string()).unwrap(),
            max_players,
            Timestamp::new(1000),
            (),
        )
    }

    #[test]
    fn test_add_player_is_idempotent() {
        // テスト項目: 同じ ID のプレイヤーを二度追加しても一人だけになる
        // given (前提条件):
        let mut room = create_test_room(2);

        // when (操作):
        let first = room.add_player(Player::new(pid("alice"), "Alice"));
        let second = room.add_player(Player::new(pid("alice"), "Alice again"));

        // then (期待する結果):
        assert_eq!(first, PlayerAdmission::Added);
        assert_eq!(second, PlayerAdmission::AlreadyPresent);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].name, "Alice");
    }

    #[test]
    fn test_first_player_becomes_host() {
        // テスト項目: 最初に着席したプレイヤーがホストになる
        // given (前提条件):
        let mut room = create_test_room(3);

        // when (操作):
        room.add_player(Player::new(pid("alice"), "Alice"));
        room.add_player(Player::new(pid("bob"), "Bob"));

        // then (期待する結果):
        assert_eq!(room.host_id, Some(pid("alice")));
        assert!(room.players[0].is_host);
        assert!(!room.players[1].is_host);
    }

    #[test]
    fn test_add_player_rejects_when_full() {
        // テスト項目: 定員を超えるプレイヤーは着席できない
        // given (前提条件):
        let mut room = create_test_room(1);
        room.add_player(Player::new(pid("alice"), "Alice"));

        // when (操作):
        let result = room.add_player(Player::new(pid("bob"), "Bob"));

        // then (期待する結果):
        assert_eq!(result, PlayerAdmission::RoomFull);
        assert_eq!(room.players.len(), 1);
    }

    #[test]
    fn test_all_ready_requires_two_players() {
        // テスト項目: 2 人以上かつ全員準備完了のときだけ all_ready になる
        // given (前提条件):
        let mut room = create_test_room(2);
        room.add_player(Player::new(pid("alice"), "Alice"));

        // when (操作):
        room.mark_ready(&pid("alice"));
        let alone = room.all_ready();
        room.add_player(Player::new(pid("bob"), "Bob"));
        let bob_waiting = room.all_ready();
        room.mark_ready(&pid("bob"));
        let everyone = room.all_ready();

        // then (期待する結果):
        assert!(!alone);
        assert!(!bob_waiting);
        assert!(everyone);
    }

    #[test]
    fn test_all_ready_for_solo_room() {
        // テスト項目: 定員 1 のルームは 1 人の準備完了で開始できる
        // given (前提条件):
        let mut room = create_test_room(1);
        room.add_player(Player::new(pid("alice"), "Alice"));

        // when (操作):
        room.mark_ready(&pid("alice"));

        // then (期待する結果):
        assert!(room.all_ready());
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        // テスト項目: waiting → in_progress → completed 以外の遷移はエラーになる
        // given (前提条件):
        let mut room = create_test_room(2);

        // when (操作):
        let premature = room.complete();
        let begin = room.begin();
        let twice = room.begin();
        let complete = room.complete();

        // then (期待する結果):
        assert!(premature.is_err());
        assert!(begin.is_ok());
        assert_eq!(
            twice,
            Err(RoomError::InvalidTransition {
                from: GameStatus::InProgress,
                to: GameStatus::InProgress
            })
        );
        assert!(complete.is_ok());
        assert_eq!(room.status, GameStatus::Completed);
    }

    #[test]
    fn test_reset_for_restart_zeroes_scores_and_bumps_epoch() {
        // テスト項目: リスタートでスコアと準備状態がリセットされ、epoch が増える
        // given (前提条件):
        let mut room = create_test_room(2);
        room.add_player(Player::new(pid("alice"), "Alice"));
        room.mark_ready(&pid("alice"));
        room.player_mut(&pid("alice")).unwrap().score = 5;
        room.status = GameStatus::Completed;

        // when (操作):
        room.reset_for_restart();

        // then (期待する結果):
        assert_eq!(room.status, GameStatus::Waiting);
        assert_eq!(room.players[0].score, 0);
        assert!(!room.players[0].ready);
        assert!(room.players[0].is_host);
        assert_eq!(room.epoch, 1);
    }

    #[test]
    fn test_unsubscribe_promotes_next_host() {
        // テスト項目: ホストが退出すると次のプレイヤーがホストに昇格する
        // given (前提条件):
        let mut room = create_test_room(3);
        let conn_alice = ConnectionId::generate();
        let conn_bob = ConnectionId::generate();
        room.add_player(Player::new(pid("alice"), "Alice"));
        room.add_player(Player::new(pid("bob"), "Bob"));
        room.subscribe(conn_alice, pid("alice"));
        room.subscribe(conn_bob, pid("bob"));

        // when (操作):
        let departure = room.unsubscribe(&conn_alice).unwrap();

        // then (期待する結果):
        assert_eq!(departure.player_id, pid("alice"));
        assert_eq!(departure.removed_index, Some(0));
        assert_eq!(departure.promoted_host, Some(pid("bob")));
        assert_eq!(room.host_id, Some(pid("bob")));
        assert!(room.players[0].is_host);
    }

    #[test]
    fn test_unsubscribe_keeps_player_with_second_connection() {
        // テスト項目: 同じ ID の別接続が残っている場合はプレイヤーを削除しない
        // given (前提条件):
        let mut room = create_test_room(2);
        let tab1 = ConnectionId::generate();
        let tab2 = ConnectionId::generate();
        room.add_player(Player::new(pid("alice"), "Alice"));
        room.subscribe(tab1, pid("alice"));
        room.subscribe(tab2, pid("alice"));

        // when (操作):
        let departure = room.unsubscribe(&tab1).unwrap();

        // then (期待する結果):
        assert!(!departure.player_removed());
        assert_eq!(room.players.len(), 1);
        assert!(!room.is_empty());
    }

    #[test]
    fn test_unsubscribe_unknown_connection_is_none() {
        // テスト項目: 購読していない接続の退出は何もしない
        // given (前提条件):
        let mut room = create_test_room(2);

        // when (操作):
        let departure = room.unsubscribe(&ConnectionId::generate());

        // then (期待する結果):
        assert!(departure.is_none());
    }

    #[test]
    fn test_next_player_after_wraps_around() {
        // テスト項目: ラウンドロビンで最後のプレイヤーの次は先頭に戻る
        // given (前提条件):
        let mut room = create_test_room(3);
        for id in ["a", "b", "c"] {
            room.add_player(Player::new(pid(id), id));
        }

        // when (操作):
        let after_a = room.next_player_after(&pid("a"));
        let after_c = room.next_player_after(&pid("c"));

        // then (期待する結果):
        assert_eq!(after_a, Some(pid("b")));
        assert_eq!(after_c, Some(pid("a")));
    }

    #[test]
    fn test_winner_prefers_first_on_tie() {
        // テスト項目: 同点の場合は名簿順で先のプレイヤーが勝者になる
        // given (前提条件):
        let mut room = create_test_room(3);
        for id in ["a", "b", "c"] {
            room.add_player(Player::new(pid(id), id));
        }
        room.player_mut(&pid("b")).unwrap().score = 2;
        room.player_mut(&pid("c")).unwrap().score = 2;

        // when (操作):
        let winner = room.winner().map(|p| p.id.clone());

        // then (期待する結果):
        assert_eq!(winner, Some(pid("b")));
    }
}
