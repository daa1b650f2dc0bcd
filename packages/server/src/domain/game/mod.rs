//! Game-specific room state and rules.
//!
//! Each type here is the `S` of a [`Room`](super::Room) for one game type.
//! All operations are pure; timing and broadcasting live in the usecase layer.

pub mod duel;
pub mod memory;
pub mod rounds;
pub mod slots;
pub mod word_search;

pub use duel::{DuelState, DuelWord};
pub use memory::{FlipOutcome, MemoryCard, MemoryError, MemoryState};
pub use rounds::{LastAnswer, RoundError, RoundLedger, TIMEOUT_SENTINEL, Verdict, normalize_answer};
pub use slots::{ConjugationPrompt, SlotsError, SlotsState};
pub use word_search::{GridCell, WordSearchError, WordSearchState};
