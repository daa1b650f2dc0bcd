//! Game Coordinator: the room lifecycle every game type shares.
//!
//! A [`Coordinator`] owns the room table of one game type. Every operation
//! takes the table lock, then checks, mutates and broadcasts before releasing
//! it, so operations on rooms of one game type never interleave and room
//! broadcasts go out in the order the mutations were applied.
//!
//! What differs between game types is supplied by a [`GameRules`]
//! implementation; game-specific operations live next to each rules type.

use std::{marker::PhantomData, sync::Arc};

use serde::Serialize;
use wortspiel_shared::time::Clock;

use crate::{
    config::GameTimings,
    domain::{
        ConnectionId, Departure, GameId, GameStatus, GameType, Player, PlayerAdmission, PlayerId,
        Room, TimerKey, Timestamp,
    },
    infrastructure::{
        dto::{
            conversion::{full_room_state, player_dtos, room_summary},
            http::RoomSummaryDto,
            websocket::{
                GameCreatedDto, GameEndedDto, JoinPayload, OutboundMessage, PlayerReadyDto,
                RoomStateDto, event,
            },
        },
        registry::ConnectionRegistry,
        repository::{InMemoryRoomRepository, RoomTable},
        scheduler::TransitionScheduler,
    },
};

use super::{broadcast::Fanout, error::GameError};

/// Seats per room when the creator does not say otherwise.
pub const DEFAULT_MAX_PLAYERS: usize = 2;

/// Game-type specific parts of the room lifecycle.
pub trait GameRules: Send + Sync + 'static {
    /// Game state stored in each room
    type State: Send + Sync + 'static;
    /// Content supplied when a room is created or restarted
    type Seed: Send + 'static;
    /// Game fields of a state update; every field optional
    type Snapshot: Serialize + Default + Send + Sync;

    const GAME_TYPE: GameType;

    fn init(seed: Self::Seed) -> Self::State;

    fn has_content(state: &Self::State) -> bool;

    /// Back to the first round or turn; content is kept.
    fn reset(state: &mut Self::State);

    /// Full game fields for a snapshot.
    fn snapshot(state: &Self::State) -> Self::Snapshot;

    /// Called once the room entered `in_progress`.
    fn start(_room: &mut Room<Self::State>) {}

    /// Called once the room entered `completed`.
    fn on_complete(_state: &mut Self::State) {}

    /// Called after a player lost their seat. Returns game fields that changed.
    fn on_player_removed(
        _room: &mut Room<Self::State>,
        _departure: &Departure,
    ) -> Option<Self::Snapshot> {
        None
    }

    /// Replace the content on restart; a seed without content keeps the old one.
    fn reseed(state: &mut Self::State, seed: Self::Seed) {
        let fresh = Self::init(seed);
        if Self::has_content(&fresh) {
            *state = fresh;
        }
    }
}

pub struct Coordinator<G: GameRules> {
    repository: Arc<InMemoryRoomRepository<G::State>>,
    scheduler: Arc<TransitionScheduler>,
    fanout: Arc<Fanout>,
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    timings: GameTimings,
    rules: PhantomData<G>,
}

impl<G: GameRules> Coordinator<G> {
    pub fn new(
        repository: Arc<InMemoryRoomRepository<G::State>>,
        scheduler: Arc<TransitionScheduler>,
        fanout: Arc<Fanout>,
        registry: Arc<ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        timings: GameTimings,
    ) -> Self {
        Self {
            repository,
            scheduler,
            fanout,
            registry,
            clock,
            timings,
            rules: PhantomData,
        }
    }

    pub fn game_type(&self) -> GameType {
        G::GAME_TYPE
    }

    pub fn repository(&self) -> &Arc<InMemoryRoomRepository<G::State>> {
        &self.repository
    }

    pub fn scheduler(&self) -> &Arc<TransitionScheduler> {
        &self.scheduler
    }

    pub(super) fn timings(&self) -> &GameTimings {
        &self.timings
    }

    /// Join a room, creating it from `payload` if it does not exist yet.
    ///
    /// Joining twice is harmless: the connection and the player are only
    /// added once. When the room is full the connection becomes a spectator.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        game_id: &GameId,
        player_id: &PlayerId,
        payload: JoinPayload<G::Seed>,
    ) -> Result<(), GameError> {
        let JoinPayload {
            player_name,
            max_players,
            host_id,
            players,
            content,
        } = payload;
        let created_at = Timestamp::new(self.clock.now_millis());

        let mut table = self.repository.lock().await;
        let (room, created) = table.insert_if_absent(game_id, || {
            let mut room = Room::new(
                game_id.clone(),
                max_players.unwrap_or(DEFAULT_MAX_PLAYERS),
                created_at,
                G::init(content),
            );
            room.host_id = host_id;
            for seed in players {
                room.add_player(Player::new(seed.id, seed.name));
            }
            room
        });

        room.subscribe(connection_id, player_id.clone());
        let name = player_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| player_id.to_string());
        match room.add_player(Player::new(player_id.clone(), name)) {
            PlayerAdmission::Added => {
                tracing::info!("Player '{}' joined {} game '{}'", player_id, G::GAME_TYPE, game_id)
            }
            PlayerAdmission::AlreadyPresent => {
                tracing::debug!("Player '{}' rejoined {} game '{}'", player_id, G::GAME_TYPE, game_id)
            }
            PlayerAdmission::RoomFull => tracing::info!(
                "{} game '{}' is full; '{}' watches as spectator",
                G::GAME_TYPE,
                game_id,
                player_id
            ),
        }

        if created {
            tracing::info!("{} game '{}' created", G::GAME_TYPE, game_id);
            let notice = OutboundMessage::new(
                G::GAME_TYPE.created_event(),
                GameCreatedDto {
                    game_id: room.game_id.clone(),
                    host_id: room.host_id.clone(),
                    max_players: room.max_players,
                    players: room.players.len(),
                },
            );
            self.fanout.to_lobby(G::GAME_TYPE, &notice).await?;
        }

        self.broadcast_full(room).await
    }

    /// Mark a player ready and start the game once everybody is.
    pub async fn ready(&self, game_id: &GameId, player_id: &PlayerId) -> Result<(), GameError> {
        let mut table = self.repository.lock().await;
        let room = room_mut(&mut table, game_id)?;
        ensure_seated(room, player_id)?;

        let notice = OutboundMessage::new(
            event::PLAYER_READY,
            PlayerReadyDto {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
            },
        );
        self.broadcast(room, &notice).await?;
        room.mark_ready(player_id);

        if room.status == GameStatus::Waiting && room.all_ready() {
            if G::has_content(&room.state) {
                room.begin()?;
                G::start(room);
                tracing::info!(
                    "{} game '{}' started with {} player(s)",
                    G::GAME_TYPE,
                    game_id,
                    room.players.len()
                );
                return self.broadcast_full(room).await;
            }
            tracing::warn!(
                "{} game '{}' has no content; it stays waiting",
                G::GAME_TYPE,
                game_id
            );
        }

        self.broadcast_update(room, roster_update(room)).await
    }

    /// Unsubscribe a connection; the room is destroyed when nobody is left.
    ///
    /// Returns `None` if the connection was not subscribed.
    pub async fn leave(
        &self,
        connection_id: &ConnectionId,
        game_id: &GameId,
    ) -> Result<Option<Departure>, GameError> {
        let mut table = self.repository.lock().await;
        let room = room_mut(&mut table, game_id)?;
        let Some(departure) = room.unsubscribe(connection_id) else {
            return Ok(None);
        };

        if room.is_empty() {
            self.destroy(&mut table, game_id).await?;
            return Ok(Some(departure));
        }

        if departure.player_removed() {
            tracing::info!(
                "Player '{}' left {} game '{}'",
                departure.player_id,
                G::GAME_TYPE,
                game_id
            );
            if let Some(host) = &departure.promoted_host {
                tracing::info!("'{}' is now host of game '{}'", host, game_id);
            }
            let game = G::on_player_removed(room, &departure);
            let mut update = roster_update(room);
            if let Some(game) = game {
                update.game = game;
            }
            self.broadcast_update(room, update).await?;
        }

        Ok(Some(departure))
    }

    /// Put the room back to `waiting`, keeping its connections and roster.
    ///
    /// When `requested_by` is given, only the host may restart.
    pub async fn restart(
        &self,
        game_id: &GameId,
        requested_by: Option<&PlayerId>,
        seed: Option<G::Seed>,
    ) -> Result<(), GameError> {
        let mut table = self.repository.lock().await;
        let room = room_mut(&mut table, game_id)?;
        if let Some(requester) = requested_by
            && !room.is_host(requester)
        {
            return Err(GameError::NotHost(requester.clone()));
        }

        let cancelled = self.scheduler.cancel_all(game_id).await;
        room.reset_for_restart();
        G::reset(&mut room.state);
        if let Some(seed) = seed {
            G::reseed(&mut room.state, seed);
        }
        tracing::info!(
            "{} game '{}' restarted (epoch {}, {} timer(s) cancelled)",
            G::GAME_TYPE,
            game_id,
            room.epoch,
            cancelled
        );

        self.broadcast_full(room).await
    }

    /// Summaries of all rooms, oldest first.
    pub async fn room_summaries(&self) -> Vec<RoomSummaryDto> {
        let table = self.repository.lock().await;
        let mut summaries = Vec::with_capacity(table.len());
        for room in table.iter() {
            let pending = self.scheduler.pending(&room.game_id).await;
            summaries.push(room_summary(room, pending));
        }
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.game_id.cmp(&b.game_id))
        });
        summaries
    }

    pub async fn count_rooms(&self) -> usize {
        self.repository.count_rooms().await
    }

    /// Complete the game, announce the winner and schedule eviction.
    pub(super) async fn finish(self: &Arc<Self>, room: &mut Room<G::State>) -> Result<(), GameError> {
        room.complete()?;
        G::on_complete(&mut room.state);

        let winner = room.winner().map(|p| p.id.to_string());
        let scores: Vec<String> = room
            .players
            .iter()
            .map(|p| format!("{}={}", p.id, p.score))
            .collect();
        tracing::info!(
            game_type = %G::GAME_TYPE,
            game_id = %room.game_id,
            winner = ?winner,
            scores = ?scores,
            "Game completed"
        );

        self.schedule_teardown(room).await;
        self.broadcast_full(room).await
    }

    async fn schedule_teardown(self: &Arc<Self>, room: &Room<G::State>) {
        let coordinator = Arc::clone(self);
        let game_id = room.game_id.clone();
        let epoch = room.epoch;
        self.scheduler
            .schedule(
                &room.game_id,
                TimerKey::Teardown,
                self.timings.completed_room_ttl,
                async move { coordinator.teardown(&game_id, epoch).await },
            )
            .await;
    }

    /// Evict a completed room nobody restarted.
    async fn teardown(&self, game_id: &GameId, epoch: u64) {
        let mut table = self.repository.lock().await;
        match table.get(game_id) {
            Some(room) if room.epoch == epoch && room.status == GameStatus::Completed => {}
            _ => {
                tracing::debug!("Skipping stale teardown of game '{}'", game_id);
                return;
            }
        }
        tracing::info!("Evicting completed {} game '{}'", G::GAME_TYPE, game_id);
        if let Err(e) = self.destroy(&mut table, game_id).await {
            tracing::warn!("Failed to announce end of game '{}': {}", game_id, e);
        }
    }

    /// Remove a room with its connection set and timers, and tell the lobby.
    async fn destroy(
        &self,
        table: &mut RoomTable<'_, G::State>,
        game_id: &GameId,
    ) -> Result<(), GameError> {
        let Some(room) = table.remove(game_id) else {
            return Ok(());
        };
        let cancelled = self.scheduler.cancel_all(game_id).await;
        for connection_id in room.connection_ids() {
            self.registry
                .exit_room(&connection_id, G::GAME_TYPE, game_id)
                .await;
        }
        tracing::info!(
            "{} game '{}' destroyed ({} timer(s) cancelled)",
            G::GAME_TYPE,
            game_id,
            cancelled
        );

        let notice = OutboundMessage::new(
            G::GAME_TYPE.ended_event(),
            GameEndedDto {
                game_id: game_id.clone(),
            },
        );
        self.fanout.to_lobby(G::GAME_TYPE, &notice).await
    }

    pub(super) async fn broadcast<T: Serialize + Sync>(
        &self,
        room: &Room<G::State>,
        message: &OutboundMessage<T>,
    ) -> Result<(), GameError> {
        self.fanout
            .to_connections(&room.connection_ids(), message)
            .await
    }

    pub(super) async fn broadcast_full(&self, room: &Room<G::State>) -> Result<(), GameError> {
        let message = OutboundMessage::state_updated(
            G::GAME_TYPE,
            full_room_state(room, G::snapshot(&room.state)),
        );
        self.broadcast(room, &message).await
    }

    pub(super) async fn broadcast_update(
        &self,
        room: &Room<G::State>,
        update: RoomStateDto<G::Snapshot>,
    ) -> Result<(), GameError> {
        let message = OutboundMessage::state_updated(G::GAME_TYPE, update);
        self.broadcast(room, &message).await
    }
}

pub(super) fn room_mut<'t, S>(
    table: &'t mut RoomTable<'_, S>,
    game_id: &GameId,
) -> Result<&'t mut Room<S>, GameError> {
    table
        .get_mut(game_id)
        .ok_or_else(|| GameError::RoomNotFound(game_id.clone()))
}

pub(super) fn ensure_seated<S>(room: &Room<S>, player_id: &PlayerId) -> Result<(), GameError> {
    if room.has_player(player_id) {
        Ok(())
    } else {
        Err(GameError::UnknownPlayer(player_id.clone()))
    }
}

pub(super) fn ensure_in_progress<S>(room: &Room<S>) -> Result<(), GameError> {
    if room.status == GameStatus::InProgress {
        Ok(())
    } else {
        Err(GameError::NotInProgress {
            game_id: room.game_id.clone(),
            status: room.status,
        })
    }
}

/// Partial update carrying the roster and host.
pub(super) fn roster_update<S, T: Default>(room: &Room<S>) -> RoomStateDto<T> {
    let mut update = RoomStateDto::partial(room.game_id.clone());
    update.players = Some(player_dtos(room));
    update.host_id = Some(room.host_id.clone());
    update
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{GameStatus, game::DuelWord},
        infrastructure::dto::websocket::{DuelSeed, PlayerSeed},
        usecase::{
            duel::DuelGame,
            test_support::{Harness, gid, join_payload, pid},
        },
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join の冪等性、満員時の観戦、ロビーへの作成通知
    // - 全員 ready でのゲーム開始（コンテンツが空なら開始しない）
    // - 全員退出でのルーム破棄（タイマーも含む）
    // - リスタートでのスコア・ready のリセットと接続の維持
    // - ホスト退出時の昇格
    // - 完了したルームの TTL 経過後の破棄
    //
    // 【なぜこのテストが必要か】
    // - ゲーム種別に依存しないライフサイクルは全ゲームの土台になる
    // ========================================

    fn duel_seed() -> DuelSeed {
        DuelSeed {
            words: vec![
                DuelWord {
                    word: "Tisch".to_string(),
                    answer: "der".to_string(),
                    translation: None,
                },
                DuelWord {
                    word: "Lampe".to_string(),
                    answer: "die".to_string(),
                    translation: None,
                },
            ],
            total_rounds: None,
            round_time_limit_secs: Some(10),
        }
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        // テスト項目: 同じ接続・同じ ID での 2 回目の join は状態を変えない
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let mut alice = harness.client(None).await;

        // when (操作):
        for _ in 0..2 {
            duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.connections.len(), 1);
        assert!(room.players[0].is_host);
        assert_eq!(room.players[0].name, "Alice");
        assert_eq!(alice.of_type("duel_game_state_updated").len(), 2);
    }

    #[tokio::test]
    async fn test_join_announces_new_room_to_lobby() {
        // テスト項目: 新しいルームはロビーに一度だけ通知される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let mut watcher = harness.client(None).await;
        harness.registry.set_lobby(&watcher.connection_id, GameType::Duel).await;
        let alice = harness.client(None).await;
        let bob = harness.client(None).await;

        // when (操作):
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), join_payload("Bob", DuelSeed::default()))
            .await
            .unwrap();

        // then (期待する結果):
        let created = watcher.of_type("duel_game_created");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["data"]["gameId"], "g1");
        assert_eq!(created[0]["data"]["hostId"], "alice");
    }

    #[tokio::test]
    async fn test_full_room_turns_joiner_into_spectator() {
        // テスト項目: 満員のルームに join した接続は観戦者としてブロードキャストを受け取る
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let bob = harness.client(None).await;
        let mut carol = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), join_payload("Bob", DuelSeed::default()))
            .await
            .unwrap();

        // when (操作):
        duel.join(carol.connection_id, &gid("g1"), &pid("carol"), join_payload("Carol", DuelSeed::default()))
            .await
            .unwrap();

        // then (期待する結果):
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.connections.len(), 3);
        let states = carol.of_type("duel_game_state_updated");
        assert_eq!(states.last().unwrap()["data"]["players"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_join_seeds_host_and_roster() {
        // テスト項目: 作成時の hostId と players がルームに反映される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let bob = harness.client(None).await;
        let mut payload = join_payload("Bob", duel_seed());
        payload.host_id = Some(pid("alice"));
        payload.players = vec![PlayerSeed {
            id: pid("alice"),
            name: "Alice".to_string(),
        }];

        // when (操作):
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), payload).await.unwrap();

        // then (期待する結果):
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.host_id, Some(pid("alice")));
        assert_eq!(
            room.players.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
        assert!(room.players[0].is_host);
        assert!(!room.players[1].is_host);
    }

    #[tokio::test]
    async fn test_all_ready_starts_game() {
        // テスト項目: 全員が ready になるとゲームが in_progress になり、最初のお題が配信される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let mut alice = harness.client(None).await;
        let bob = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), join_payload("Bob", DuelSeed::default()))
            .await
            .unwrap();

        // when (操作):
        duel.ready(&gid("g1"), &pid("alice")).await.unwrap();
        let after_first = duel.repository().get_room(&gid("g1")).await.unwrap().status;
        alice.messages();
        duel.ready(&gid("g1"), &pid("bob")).await.unwrap();

        // then (期待する結果):
        assert_eq!(after_first, GameStatus::Waiting);
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.status, GameStatus::InProgress);
        let messages = alice.messages();
        assert_eq!(messages[0]["type"], "player_ready");
        assert_eq!(messages[0]["data"]["playerId"], "bob");
        let state = &messages[1];
        assert_eq!(state["type"], "duel_game_state_updated");
        assert_eq!(state["data"]["status"], "in_progress");
        assert_eq!(state["data"]["currentWord"]["word"], "Tisch");
        assert!(state["data"]["currentWord"].get("answer").is_none());
    }

    #[tokio::test]
    async fn test_ready_without_content_stays_waiting() {
        // テスト項目: コンテンツが空のルームは全員 ready でも開始しない
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let mut payload = join_payload("Alice", DuelSeed::default());
        payload.max_players = Some(1);
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), payload).await.unwrap();

        // when (操作):
        let result = duel.ready(&gid("g1"), &pid("alice")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.status, GameStatus::Waiting);
        assert!(room.players[0].ready);
    }

    #[tokio::test]
    async fn test_ready_rejects_unknown_player_and_room() {
        // テスト項目: 存在しないルーム・着席していないプレイヤーの ready は拒否される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();

        // when (操作):
        let missing_room = duel.ready(&gid("nope"), &pid("alice")).await;
        let stranger = duel.ready(&gid("g1"), &pid("mallory")).await;

        // then (期待する結果):
        assert_eq!(missing_room, Err(GameError::RoomNotFound(gid("nope"))));
        assert_eq!(stranger, Err(GameError::UnknownPlayer(pid("mallory"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_leave_destroys_room_and_timers() {
        // テスト項目: 最後の接続が抜けるとルームとタイマーが破棄され、ロビーに終了が通知される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let mut watcher = harness.client(None).await;
        harness.registry.set_lobby(&watcher.connection_id, GameType::Duel).await;
        let alice = harness.client(None).await;
        let bob = harness.client(None).await;
        for (client, id) in [(&alice, "alice"), (&bob, "bob")] {
            duel.join(client.connection_id, &gid("g1"), &pid(id), join_payload(id, duel_seed()))
                .await
                .unwrap();
            duel.ready(&gid("g1"), &pid(id)).await.unwrap();
        }
        duel.submit_answer(&gid("g1"), &pid("alice"), "der", false, None)
            .await
            .unwrap();
        assert_eq!(duel.scheduler().pending(&gid("g1")).await, 1);

        // when (操作):
        duel.leave(&alice.connection_id, &gid("g1")).await.unwrap();
        duel.leave(&bob.connection_id, &gid("g1")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // then (期待する結果):
        assert!(duel.repository().get_room(&gid("g1")).await.is_none());
        assert_eq!(duel.scheduler().pending(&gid("g1")).await, 0);
        let ended = watcher.of_type("duel_game_ended");
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0]["data"]["gameId"], "g1");
        assert_eq!(
            duel.ready(&gid("g1"), &pid("alice")).await,
            Err(GameError::RoomNotFound(gid("g1")))
        );
    }

    #[tokio::test]
    async fn test_host_leaving_promotes_next_player() {
        // テスト項目: ホストが抜けると次のプレイヤーがホストになり、残りに通知される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let mut bob = harness.client(None).await;
        let mut payload = join_payload("Alice", duel_seed());
        payload.max_players = Some(3);
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), payload).await.unwrap();
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), join_payload("Bob", DuelSeed::default()))
            .await
            .unwrap();
        bob.messages();

        // when (操作):
        let departure = duel.leave(&alice.connection_id, &gid("g1")).await.unwrap();

        // then (期待する結果):
        assert_eq!(departure.unwrap().promoted_host, Some(pid("bob")));
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.host_id, Some(pid("bob")));
        let update = bob.of_type("duel_game_state_updated");
        assert_eq!(update.len(), 1);
        assert_eq!(update[0]["data"]["hostId"], "bob");
        assert!(update[0]["data"].get("status").is_none());
    }

    #[tokio::test]
    async fn test_leave_keeps_player_with_second_connection() {
        // テスト項目: 同じ ID の別接続が残っている間はプレイヤーは席を失わない
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let tab1 = harness.client(None).await;
        let tab2 = harness.client(None).await;
        for tab in [&tab1, &tab2] {
            duel.join(tab.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
                .await
                .unwrap();
        }

        // when (操作):
        let departure = duel.leave(&tab1.connection_id, &gid("g1")).await.unwrap().unwrap();

        // then (期待する結果):
        assert!(!departure.player_removed());
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.connections.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_scores_and_keeps_membership() {
        // テスト項目: リスタートでスコア・ready がリセットされ、接続とホストは維持され、タイマーが取り消される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let mut bob = harness.client(None).await;
        for (client, id) in [(&alice, "alice"), (&bob, "bob")] {
            duel.join(client.connection_id, &gid("g1"), &pid(id), join_payload(id, duel_seed()))
                .await
                .unwrap();
            duel.ready(&gid("g1"), &pid(id)).await.unwrap();
        }
        duel.submit_answer(&gid("g1"), &pid("alice"), "der", false, None)
            .await
            .unwrap();

        // when (操作):
        duel.restart(&gid("g1"), Some(&pid("alice")), None).await.unwrap();
        bob.messages();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // then (期待する結果):
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.status, GameStatus::Waiting);
        assert_eq!(room.epoch, 1);
        assert_eq!(room.connections.len(), 2);
        assert_eq!(room.host_id, Some(pid("alice")));
        assert!(room.players.iter().all(|p| p.score == 0 && !p.ready));
        assert_eq!(room.state.current_round(), 0);
        assert!(room.state.ledger.last_answer.is_none());
        assert_eq!(duel.scheduler().pending(&gid("g1")).await, 0);
        // 取り消されたラウンド進行は発火しない
        assert!(bob.messages().is_empty());
    }

    #[tokio::test]
    async fn test_restart_by_non_host_is_rejected() {
        // テスト項目: ホスト以外のリスタート要求は拒否される
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let bob = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();
        duel.join(bob.connection_id, &gid("g1"), &pid("bob"), join_payload("Bob", DuelSeed::default()))
            .await
            .unwrap();

        // when (操作):
        let result = duel.restart(&gid("g1"), Some(&pid("bob")), None).await;

        // then (期待する結果):
        assert_eq!(result, Err(GameError::NotHost(pid("bob"))));
    }

    #[tokio::test]
    async fn test_restart_reseeds_content() {
        // テスト項目: リスタート時に新しいコンテンツを渡すと差し替わり、空なら元のまま
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();
        let fresh = DuelSeed {
            words: vec![DuelWord {
                word: "Haus".to_string(),
                answer: "das".to_string(),
                translation: None,
            }],
            ..DuelSeed::default()
        };

        // when (操作):
        duel.restart(&gid("g1"), None, Some(DuelSeed::default())).await.unwrap();
        let kept = duel.repository().get_room(&gid("g1")).await.unwrap().state.total_rounds;
        duel.restart(&gid("g1"), None, Some(fresh)).await.unwrap();

        // then (期待する結果):
        assert_eq!(kept, 2);
        let room = duel.repository().get_room(&gid("g1")).await.unwrap();
        assert_eq!(room.state.total_rounds, 1);
        assert_eq!(room.state.current_word().unwrap().word, "Haus");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_room_is_evicted_after_ttl() {
        // テスト項目: 完了したルームは TTL 経過後に破棄され、リスタートすると破棄されない
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        let mut payload = join_payload("Alice", DuelSeed {
            words: duel_seed().words,
            total_rounds: Some(1),
            round_time_limit_secs: None,
        });
        payload.max_players = Some(1);
        for game_id in ["g1", "g2"] {
            duel.join(alice.connection_id, &gid(game_id), &pid("alice"), payload.clone())
                .await
                .unwrap();
            duel.ready(&gid(game_id), &pid("alice")).await.unwrap();
            duel.submit_answer(&gid(game_id), &pid("alice"), "der", false, None)
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
        let status = duel.repository().get_room(&gid("g1")).await.unwrap().status;

        // when (操作):
        duel.restart(&gid("g2"), None, None).await.unwrap();
        tokio::time::sleep(duel.timings().completed_room_ttl).await;

        // then (期待する結果):
        assert_eq!(status, GameStatus::Completed);
        assert!(duel.repository().get_room(&gid("g1")).await.is_none());
        assert!(duel.repository().get_room(&gid("g2")).await.is_some());
    }

    #[tokio::test]
    async fn test_room_summaries() {
        // テスト項目: ルーム概要の一覧が取得できる
        // given (前提条件):
        let harness = Harness::new();
        let duel = harness.coordinator::<DuelGame>();
        let alice = harness.client(None).await;
        duel.join(alice.connection_id, &gid("g1"), &pid("alice"), join_payload("Alice", duel_seed()))
            .await
            .unwrap();

        // when (操作):
        let summaries = duel.room_summaries().await;

        // then (期待する結果):
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].game_id, "g1");
        assert_eq!(summaries[0].players, vec!["alice".to_string()]);
        assert_eq!(summaries[0].status, GameStatus::Waiting);
        assert_eq!(duel.count_rooms().await, 1);
    }
}
