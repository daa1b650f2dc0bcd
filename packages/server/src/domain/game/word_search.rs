//! Word search: everyone hunts the same grid; each word goes to its first finder.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PlayerId;

/// A grid coordinate as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordSearchError {
    #[error("'{0}' is not one of the hidden words")]
    UnknownWord(String),

    #[error("'{word}' was already found by {by}")]
    AlreadyClaimed { word: String, by: PlayerId },

    #[error("the selected cells do not spell '{0}'")]
    PathMismatch(String),
}

#[derive(Debug, Clone, Default)]
pub struct WordSearchState {
    /// Grid rows, uppercase
    pub grid: Vec<String>,
    /// Hidden words, uppercase and unique
    pub words: Vec<String>,
    /// Words each player has found
    pub found: BTreeMap<PlayerId, BTreeSet<String>>,
}

impl WordSearchState {
    pub fn new(grid: Vec<String>, words: Vec<String>) -> Self {
        let grid = grid.iter().map(|row| row.to_uppercase()).collect();
        let mut unique = BTreeSet::new();
        let words = words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| !w.is_empty() && unique.insert(w.clone()))
            .collect();
        Self {
            grid,
            words,
            found: BTreeMap::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.words.is_empty()
    }

    /// Who found `word`, if anyone.
    pub fn claimed_by(&self, word: &str) -> Option<&PlayerId> {
        self.found
            .iter()
            .find(|(_, words)| words.contains(word))
            .map(|(player_id, _)| player_id)
    }

    /// Claim a word for `player_id`. Returns the normalized word.
    ///
    /// When `cells` is given, it must spell the word on the grid.
    pub fn claim(
        &mut self,
        player_id: &PlayerId,
        word: &str,
        cells: Option<&[GridCell]>,
    ) -> Result<String, WordSearchError> {
        let word = normalize_word(word);
        if !self.words.contains(&word) {
            return Err(WordSearchError::UnknownWord(word));
        }
        if let Some(by) = self.claimed_by(&word) {
            return Err(WordSearchError::AlreadyClaimed {
                word,
                by: by.clone(),
            });
        }
        if let Some(cells) = cells
            && self.spell(cells).as_deref() != Some(word.as_str())
        {
            return Err(WordSearchError::PathMismatch(word));
        }

        self.found
            .entry(player_id.clone())
            .or_default()
            .insert(word.clone());
        Ok(word)
    }

    /// Letters under `cells`, or `None` if any cell is off the grid.
    fn spell(&self, cells: &[GridCell]) -> Option<String> {
        cells
            .iter()
            .map(|cell| self.grid.get(cell.row)?.chars().nth(cell.col))
            .collect()
    }

    /// True when all players' found sets together cover the word list.
    pub fn is_complete(&self) -> bool {
        if self.words.is_empty() {
            return false;
        }
        let union: BTreeSet<&String> = self.found.values().flatten().collect();
        self.words.iter().all(|w| union.contains(w))
    }

    pub fn found_count(&self) -> usize {
        self.found.values().map(BTreeSet::len).sum()
    }

    pub fn reset(&mut self) {
        self.found.clear();
    }
}

fn normalize_word(word: &str) -> String {
    word.trim().to_uppercase()
}
