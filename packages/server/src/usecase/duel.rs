//! Duel rules: everybody answers the same word, round after round.

use crate::{
    domain::{
        GameType,
        game::{DuelState, RoundLedger},
    },
    infrastructure::dto::websocket::{DuelSeed, DuelStateDto},
};

use super::{
    coordinator::{Coordinator, GameRules},
    error::GameError,
    rounds::RoundRules,
};

pub struct DuelGame;

pub type DuelCoordinator = Coordinator<DuelGame>;

impl GameRules for DuelGame {
    type State = DuelState;
    type Seed = DuelSeed;
    type Snapshot = DuelStateDto;

    const GAME_TYPE: GameType = GameType::Duel;

    fn init(seed: DuelSeed) -> DuelState {
        DuelState::new(seed.words, seed.total_rounds, seed.round_time_limit_secs)
    }

    fn has_content(state: &DuelState) -> bool {
        state.has_content()
    }

    fn reset(state: &mut DuelState) {
        state.ledger.reset();
    }

    fn snapshot(state: &DuelState) -> DuelStateDto {
        DuelStateDto {
            current_round: Some(state.current_round()),
            total_rounds: Some(state.total_rounds),
            round_time_limit_secs: Some(state.round_time_limit_secs),
            current_word: Some(state.current_word().map(Into::into)),
            last_answer: Some(state.ledger.last_answer.as_ref().map(Into::into)),
        }
    }

    fn on_complete(state: &mut DuelState) {
        state.ledger.release();
    }
}

impl RoundRules for DuelGame {
    fn ledger(state: &DuelState) -> &RoundLedger {
        &state.ledger
    }

    fn ledger_mut(state: &mut DuelState) -> &mut RoundLedger {
        &mut state.ledger
    }

    fn active_prompt(state: &DuelState) -> Result<(String, String), GameError> {
        state
            .current_word()
            .map(|word| (word.word.clone(), word.answer.clone()))
            .ok_or(GameError::NoActiveRound)
    }

    fn is_final_round(state: &DuelState) -> bool {
        state.is_final_round()
    }

    fn answer_update(state: &DuelState) -> DuelStateDto {
        DuelStateDto {
            last_answer: Some(state.ledger.last_answer.as_ref().map(Into::into)),
            ..DuelStateDto::default()
        }
    }
}
