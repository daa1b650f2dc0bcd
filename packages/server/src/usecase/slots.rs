//! Slots rules: a spin reveals the prompt of a round, then players conjugate.

use std::sync::Arc;

use crate::{
    domain::{
        GameId, GameType, PlayerId,
        game::{ConjugationPrompt, RoundLedger, SlotsState},
    },
    infrastructure::dto::websocket::{
        OutboundMessage, RoomStateDto, SlotsSeed, SlotsStateDto, SpinResultDto, event,
    },
};

use super::{
    coordinator::{Coordinator, GameRules, ensure_in_progress, ensure_seated, room_mut},
    error::GameError,
    rounds::RoundRules,
};

pub struct SlotsGame;

pub type SlotsCoordinator = Coordinator<SlotsGame>;

impl GameRules for SlotsGame {
    type State = SlotsState;
    type Seed = SlotsSeed;
    type Snapshot = SlotsStateDto;

    const GAME_TYPE: GameType = GameType::Slots;

    fn init(seed: SlotsSeed) -> SlotsState {
        SlotsState::new(seed.prompts, seed.total_rounds, seed.round_time_limit_secs)
    }

    fn has_content(state: &SlotsState) -> bool {
        state.has_content()
    }

    fn reset(state: &mut SlotsState) {
        state.reset();
    }

    fn snapshot(state: &SlotsState) -> SlotsStateDto {
        let revealed = if state.is_spun() {
            state.current_prompt().map(Into::into)
        } else {
            None
        };
        SlotsStateDto {
            current_round: Some(state.current_round()),
            total_rounds: Some(state.total_rounds),
            round_time_limit_secs: Some(state.round_time_limit_secs),
            spun: Some(state.is_spun()),
            current_prompt: Some(revealed),
            last_answer: Some(state.ledger.last_answer.as_ref().map(Into::into)),
        }
    }

    fn on_complete(state: &mut SlotsState) {
        state.ledger.release();
    }
}

impl RoundRules for SlotsGame {
    fn ledger(state: &SlotsState) -> &RoundLedger {
        &state.ledger
    }

    fn ledger_mut(state: &mut SlotsState) -> &mut RoundLedger {
        &mut state.ledger
    }

    fn active_prompt(state: &SlotsState) -> Result<(String, String), GameError> {
        let prompt = state.answerable_prompt()?;
        Ok((prompt.verb.clone(), prompt.answer.clone()))
    }

    fn is_final_round(state: &SlotsState) -> bool {
        state.is_final_round()
    }

    fn answer_update(state: &SlotsState) -> SlotsStateDto {
        SlotsStateDto {
            last_answer: Some(state.ledger.last_answer.as_ref().map(Into::into)),
            ..SlotsStateDto::default()
        }
    }
}

impl Coordinator<SlotsGame> {
    /// Reveal the prompt of the active round. Only the first spin counts.
    pub async fn start_spin(
        self: &Arc<Self>,
        game_id: &GameId,
        player_id: &PlayerId,
    ) -> Result<ConjugationPrompt, GameError> {
        let mut table = self.repository().lock().await;
        let room = room_mut(&mut table, game_id)?;
        ensure_in_progress(room)?;
        ensure_seated(room, player_id)?;

        let prompt = room.state.spin()?;
        let round = room.state.current_round();
        tracing::debug!("'{}' spun round {} of game '{}'", player_id, round, game_id);

        let notice = OutboundMessage::new(
            event::SPIN_RESULT,
            SpinResultDto {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
                round,
                prompt: (&prompt).into(),
            },
        );
        self.broadcast(room, &notice).await?;

        let mut update = RoomStateDto::<SlotsStateDto>::partial(game_id.clone());
        update.game.spun = Some(true);
        update.game.current_prompt = Some(Some((&prompt).into()));
        self.broadcast_update(room, update).await?;

        Ok(prompt)
    }
}
