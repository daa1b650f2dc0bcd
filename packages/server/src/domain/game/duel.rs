//! Duel: players race to answer the same prompt, round after round.
//!
//! Typical content is a noun whose article must be named ("Tisch" → "der")
//! or a word to translate.

use serde::{Deserialize, Serialize};

use super::rounds::RoundLedger;

/// One round of duel content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelWord {
    pub word: String,
    /// Expected answer, e.g. the article
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DuelState {
    pub words: Vec<DuelWord>,
    pub total_rounds: usize,
    pub round_time_limit_secs: Option<u32>,
    pub ledger: RoundLedger,
}

impl DuelState {
    /// `total_rounds` caps the number of rounds played; it never exceeds the
    /// number of words supplied.
    pub fn new(
        words: Vec<DuelWord>,
        total_rounds: Option<usize>,
        round_time_limit_secs: Option<u32>,
    ) -> Self {
        let total_rounds = total_rounds.map_or(words.len(), |n| n.min(words.len()));
        Self {
            words,
            total_rounds,
            round_time_limit_secs,
            ledger: RoundLedger::default(),
        }
    }

    pub fn has_content(&self) -> bool {
        self.total_rounds > 0
    }

    pub fn current_round(&self) -> usize {
        self.ledger.current_round
    }

    /// Word of the active round, or `None` once past the last round.
    pub fn current_word(&self) -> Option<&DuelWord> {
        if self.ledger.current_round >= self.total_rounds {
            return None;
        }
        self.words.get(self.ledger.current_round)
    }

    pub fn is_final_round(&self) -> bool {
        self.ledger.current_round + 1 >= self.total_rounds
    }
}
