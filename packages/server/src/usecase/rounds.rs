//! Timed rounds shared by duel and slots.
//!
//! A correct answer or an accepted timeout resolves the round. The answer
//! stays on screen for `answer_reveal_delay`, then the round advances (or the
//! game completes after the last one).

use std::sync::Arc;

use crate::{
    domain::{GameId, GameStatus, PlayerId, Room, TimerKey, game::{RoundLedger, TIMEOUT_SENTINEL, Verdict}},
    infrastructure::dto::{
        conversion::player_dtos,
        websocket::{AnswerSubmittedDto, OutboundMessage, RoomStateDto, event},
    },
};

use super::{
    coordinator::{Coordinator, GameRules, ensure_in_progress, ensure_seated, room_mut},
    error::GameError,
};

/// Games played as a sequence of timed rounds.
pub trait RoundRules: GameRules {
    fn ledger(state: &Self::State) -> &RoundLedger;

    fn ledger_mut(state: &mut Self::State) -> &mut RoundLedger;

    /// Prompt shown and answer expected in the active round.
    fn active_prompt(state: &Self::State) -> Result<(String, String), GameError>;

    fn is_final_round(state: &Self::State) -> bool;

    /// Game fields of the update that follows a submission.
    fn answer_update(state: &Self::State) -> Self::Snapshot;
}

impl<G: RoundRules> Coordinator<G> {
    /// Judge an answer for the active round.
    ///
    /// Only the first correct answer of a round scores, and a round times out
    /// at most once. `round` is the round the client answered, if it says.
    pub async fn submit_answer(
        self: &Arc<Self>,
        game_id: &GameId,
        player_id: &PlayerId,
        answer: &str,
        is_timeout: bool,
        round: Option<usize>,
    ) -> Result<Verdict, GameError> {
        let mut table = self.repository().lock().await;
        let room = room_mut(&mut table, game_id)?;
        ensure_in_progress(room)?;
        ensure_seated(room, player_id)?;

        let (prompt, expected) = G::active_prompt(&room.state)?;
        let ledger = G::ledger_mut(&mut room.state);
        let current = ledger.current_round;
        let verdict = ledger.judge(player_id, &expected, answer, round, is_timeout)?;
        let shown = if verdict == Verdict::Timeout {
            TIMEOUT_SENTINEL.to_string()
        } else {
            answer.to_string()
        };

        if verdict.scored()
            && let Some(player) = room.player_mut(player_id)
        {
            player.score += 1;
        }
        tracing::debug!(
            "'{}' answered round {} of game '{}': {:?}",
            player_id,
            current,
            game_id,
            verdict
        );

        let notice = OutboundMessage::new(
            event::ANSWER_SUBMITTED,
            AnswerSubmittedDto {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
                round: current,
                prompt,
                answer: shown,
                correct: verdict.is_correct(),
                scored: verdict.scored(),
            },
        );
        self.broadcast(room, &notice).await?;

        let mut update = RoomStateDto::partial(game_id.clone());
        update.players = Some(player_dtos(room));
        update.game = G::answer_update(&room.state);
        self.broadcast_update(room, update).await?;

        if verdict.resolves_round() {
            self.schedule_round_advance(room, current).await;
        }
        Ok(verdict)
    }

    async fn schedule_round_advance(self: &Arc<Self>, room: &Room<G::State>, round: usize) {
        let coordinator = Arc::clone(self);
        let game_id = room.game_id.clone();
        let epoch = room.epoch;
        self.scheduler()
            .schedule(
                &room.game_id,
                TimerKey::RoundAdvance(round),
                self.timings().answer_reveal_delay,
                async move { coordinator.advance_round(&game_id, epoch, round).await },
            )
            .await;
    }

    async fn advance_round(self: &Arc<Self>, game_id: &GameId, epoch: u64, round: usize) {
        let mut table = self.repository().lock().await;
        let Some(room) = table.get_mut(game_id) else {
            tracing::debug!("Round advance for vanished game '{}'", game_id);
            return;
        };
        if room.epoch != epoch
            || room.status != GameStatus::InProgress
            || G::ledger(&room.state).current_round != round
        {
            tracing::debug!("Skipping stale round advance of game '{}'", game_id);
            return;
        }

        let result = if G::is_final_round(&room.state) {
            self.finish(room).await
        } else {
            G::ledger_mut(&mut room.state).advance();
            tracing::debug!("Game '{}' advanced to round {}", game_id, round + 1);
            self.broadcast_full(room).await
        };
        if let Err(e) = result {
            tracing::warn!("Failed to advance round of game '{}': {}", game_id, e);
        }
    }
}
