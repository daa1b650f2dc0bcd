//! Memory: players take turns flipping two cards, looking for matching pairs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PlayerId;

/// A card of the deck. Two cards match when their `pair_key`s are equal
/// (e.g. a German word and its translation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCard {
    pub pair_key: String,
    pub face: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("the turn is being handed over")]
    TurnLocked,

    #[error("card {0} does not exist")]
    InvalidCard(usize),

    #[error("card {0} is already face up or matched")]
    CardUnavailable(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// First card of the turn
    First,
    /// Second card matched the first
    Matched,
    /// Second card did not match
    Mismatched,
}

impl FlipOutcome {
    pub fn completes_turn(&self) -> bool {
        !matches!(self, FlipOutcome::First)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub cards: Vec<MemoryCard>,
    pub matched: BTreeSet<usize>,
    pub face_up: Vec<usize>,
    pub current_turn: Option<PlayerId>,
    pub moves: BTreeMap<PlayerId, u32>,
    /// Set after the second flip until the turn is handed over
    pub turn_locked: bool,
}

impl MemoryState {
    pub fn new(cards: Vec<MemoryCard>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    pub fn has_content(&self) -> bool {
        self.cards.len() >= 2
    }

    pub fn flip(&mut self, player_id: &PlayerId, index: usize) -> Result<FlipOutcome, MemoryError> {
        if self.current_turn.as_ref() != Some(player_id) {
            return Err(MemoryError::NotYourTurn(player_id.clone()));
        }
        if self.turn_locked {
            return Err(MemoryError::TurnLocked);
        }
        if index >= self.cards.len() {
            return Err(MemoryError::InvalidCard(index));
        }
        if self.matched.contains(&index) || self.face_up.contains(&index) {
            return Err(MemoryError::CardUnavailable(index));
        }

        self.face_up.push(index);
        let [first, second] = match self.face_up.as_slice() {
            [first, second] => [*first, *second],
            _ => return Ok(FlipOutcome::First),
        };

        *self.moves.entry(player_id.clone()).or_default() += 1;
        self.turn_locked = true;
        if self.cards[first].pair_key == self.cards[second].pair_key {
            self.matched.insert(first);
            self.matched.insert(second);
            Ok(FlipOutcome::Matched)
        } else {
            Ok(FlipOutcome::Mismatched)
        }
    }

    /// Turn face-up cards back and hand the turn to `next`.
    pub fn finish_turn(&mut self, next: Option<PlayerId>) {
        self.face_up.clear();
        self.turn_locked = false;
        self.current_turn = next;
    }

    /// True once no two unmatched cards share a pair key.
    pub fn is_cleared(&self) -> bool {
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        for (index, card) in self.cards.iter().enumerate() {
            if !self.matched.contains(&index) {
                *remaining.entry(card.pair_key.as_str()).or_default() += 1;
            }
        }
        remaining.values().all(|count| *count < 2)
    }

    pub fn reset(&mut self) {
        self.matched.clear();
        self.face_up.clear();
        self.current_turn = None;
        self.moves.clear();
        self.turn_locked = false;
    }
}
