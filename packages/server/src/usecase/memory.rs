//! Memory rules: players take turns flipping two cards.
//!
//! After the second flip of a turn the cards stay visible for
//! `turn_display_delay`; then they are turned back and the turn passes to the
//! next player in roster order, wrapping around.

use std::sync::Arc;

use crate::{
    domain::{
        Departure, GameId, GameStatus, GameType, PlayerId, Room, TimerKey,
        game::{FlipOutcome, MemoryState},
    },
    infrastructure::dto::{
        conversion::player_dtos,
        websocket::{
            CardDto, CardFlippedDto, MemorySeed, MemoryStateDto, OutboundMessage, RoomStateDto,
            event,
        },
    },
};

use super::{
    coordinator::{Coordinator, GameRules, ensure_in_progress, ensure_seated, room_mut},
    error::GameError,
};

pub struct MemoryGame;

pub type MemoryCoordinator = Coordinator<MemoryGame>;

/// Cards as clients may see them.
fn card_dtos(state: &MemoryState) -> Vec<CardDto> {
    state
        .cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let matched = state.matched.contains(&index);
            let visible = matched || state.face_up.contains(&index);
            CardDto {
                index,
                face: visible.then(|| card.face.clone()),
                matched,
            }
        })
        .collect()
}

/// Game fields that change when cards are flipped or turned back.
fn board_update(state: &MemoryState) -> MemoryStateDto {
    MemoryStateDto {
        cards: Some(card_dtos(state)),
        face_up: Some(state.face_up.clone()),
        current_turn: Some(state.current_turn.clone()),
        moves: None,
    }
}

impl GameRules for MemoryGame {
    type State = MemoryState;
    type Seed = MemorySeed;
    type Snapshot = MemoryStateDto;

    const GAME_TYPE: GameType = GameType::Memory;

    fn init(seed: MemorySeed) -> MemoryState {
        MemoryState::new(seed.cards)
    }

    fn has_content(state: &MemoryState) -> bool {
        state.has_content()
    }

    fn reset(state: &mut MemoryState) {
        state.reset();
    }

    fn snapshot(state: &MemoryState) -> MemoryStateDto {
        MemoryStateDto {
            moves: Some(state.moves.clone()),
            ..board_update(state)
        }
    }

    fn start(room: &mut Room<MemoryState>) {
        room.state.current_turn = room.players.first().map(|p| p.id.clone());
    }

    /// The turn passes to whoever followed a departing turn holder.
    ///
    /// A cleared board keeps its locked turn so the pending advance completes the game.
    fn on_player_removed(
        room: &mut Room<MemoryState>,
        departure: &Departure,
    ) -> Option<MemoryStateDto> {
        if room.status != GameStatus::InProgress
            || room.state.current_turn.as_ref() != Some(&departure.player_id)
            || room.state.is_cleared()
        {
            return None;
        }
        let next = match departure.removed_index {
            Some(index) if !room.players.is_empty() => {
                Some(room.players[index % room.players.len()].id.clone())
            }
            _ => None,
        };
        room.state.finish_turn(next);
        Some(board_update(&room.state))
    }
}

impl Coordinator<MemoryGame> {
    /// Flip a card for the player whose turn it is.
    pub async fn flip_card(
        self: &Arc<Self>,
        game_id: &GameId,
        player_id: &PlayerId,
        card_index: usize,
    ) -> Result<FlipOutcome, GameError> {
        let mut table = self.repository().lock().await;
        let room = room_mut(&mut table, game_id)?;
        ensure_in_progress(room)?;
        ensure_seated(room, player_id)?;

        let outcome = room.state.flip(player_id, card_index)?;
        if outcome == FlipOutcome::Matched
            && let Some(player) = room.player_mut(player_id)
        {
            player.score += 1;
        }
        tracing::debug!(
            "'{}' flipped card {} in game '{}': {:?}",
            player_id,
            card_index,
            game_id,
            outcome
        );

        let notice = OutboundMessage::new(
            event::CARD_FLIPPED,
            CardFlippedDto {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
                card_index,
                face: room.state.cards[card_index].face.clone(),
            },
        );
        self.broadcast(room, &notice).await?;

        let mut update = RoomStateDto::partial(game_id.clone());
        update.players = Some(player_dtos(room));
        update.game = MemoryGame::snapshot(&room.state);
        self.broadcast_update(room, update).await?;

        if outcome.completes_turn() {
            self.schedule_turn_advance(room, player_id).await;
        }
        Ok(outcome)
    }

    async fn schedule_turn_advance(self: &Arc<Self>, room: &Room<MemoryState>, holder: &PlayerId) {
        let coordinator = Arc::clone(self);
        let game_id = room.game_id.clone();
        let holder = holder.clone();
        let epoch = room.epoch;
        self.scheduler()
            .schedule(
                &room.game_id,
                TimerKey::TurnAdvance,
                self.timings().turn_display_delay,
                async move { coordinator.advance_turn(&game_id, epoch, &holder).await },
            )
            .await;
    }

    async fn advance_turn(self: &Arc<Self>, game_id: &GameId, epoch: u64, holder: &PlayerId) {
        let mut table = self.repository().lock().await;
        let Some(room) = table.get_mut(game_id) else {
            tracing::debug!("Turn advance for vanished game '{}'", game_id);
            return;
        };
        if room.epoch != epoch || room.status != GameStatus::InProgress {
            tracing::debug!("Skipping stale turn advance of game '{}'", game_id);
            return;
        }

        // A cleared board ends the game whoever holds the turn by now.
        let result = if room.state.is_cleared() {
            room.state.finish_turn(None);
            self.finish(room).await
        } else if room.state.current_turn.as_ref() != Some(holder) || !room.state.turn_locked {
            tracing::debug!("Skipping stale turn advance of game '{}'", game_id);
            return;
        } else {
            let next = room.next_player_after(holder);
            room.state.finish_turn(next);
            tracing::debug!(
                "Turn of game '{}' passed to {:?}",
                game_id,
                room.state.current_turn.as_ref().map(PlayerId::as_str)
            );
            let mut update = RoomStateDto::partial(game_id.clone());
            update.game = board_update(&room.state);
            self.broadcast_update(room, update).await
        };
        if let Err(e) = result {
            tracing::warn!("Failed to advance turn of game '{}': {}", game_id, e);
        }
    }
}
