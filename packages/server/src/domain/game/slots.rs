//! Slots: a spin reveals verb, tense and pronoun; players type the conjugation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rounds::RoundLedger;

/// One spin's worth of conjugation content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConjugationPrompt {
    pub verb: String,
    pub tense: String,
    pub pronoun: String,
    /// Expected conjugated form, e.g. "wir liefen"
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotsError {
    #[error("round {0} has already been spun")]
    AlreadySpun(usize),

    #[error("round {0} has not been spun yet")]
    NotSpun(usize),

    #[error("no prompt for round {0}")]
    NoPrompt(usize),
}

#[derive(Debug, Clone, Default)]
pub struct SlotsState {
    pub prompts: Vec<ConjugationPrompt>,
    pub total_rounds: usize,
    pub round_time_limit_secs: Option<u32>,
    pub ledger: RoundLedger,
    spun_round: Option<usize>,
}

impl SlotsState {
    pub fn new(
        prompts: Vec<ConjugationPrompt>,
        total_rounds: Option<usize>,
        round_time_limit_secs: Option<u32>,
    ) -> Self {
        let total_rounds = total_rounds.map_or(prompts.len(), |n| n.min(prompts.len()));
        Self {
            prompts,
            total_rounds,
            round_time_limit_secs,
            ledger: RoundLedger::default(),
            spun_round: None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.total_rounds > 0
    }

    pub fn current_round(&self) -> usize {
        self.ledger.current_round
    }

    pub fn current_prompt(&self) -> Option<&ConjugationPrompt> {
        if self.ledger.current_round >= self.total_rounds {
            return None;
        }
        self.prompts.get(self.ledger.current_round)
    }

    /// Whether the active round's prompt has been revealed.
    pub fn is_spun(&self) -> bool {
        self.spun_round == Some(self.ledger.current_round)
    }

    /// Reveal the active round's prompt. Only the first spin of a round counts.
    pub fn spin(&mut self) -> Result<ConjugationPrompt, SlotsError> {
        let round = self.ledger.current_round;
        if self.is_spun() {
            return Err(SlotsError::AlreadySpun(round));
        }
        let prompt = self
            .current_prompt()
            .cloned()
            .ok_or(SlotsError::NoPrompt(round))?;
        self.spun_round = Some(round);
        Ok(prompt)
    }

    /// Prompt an answer is judged against; requires the round to be spun.
    pub fn answerable_prompt(&self) -> Result<&ConjugationPrompt, SlotsError> {
        let round = self.ledger.current_round;
        if !self.is_spun() {
            return Err(SlotsError::NotSpun(round));
        }
        self.current_prompt().ok_or(SlotsError::NoPrompt(round))
    }

    pub fn is_final_round(&self) -> bool {
        self.ledger.current_round + 1 >= self.total_rounds
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
        self.spun_round = None;
    }
}
