//! Keys for delayed room transitions.

use std::fmt;

/// Identifies one pending delayed transition within a room.
///
/// At most one timer exists per `(GameId, TimerKey)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Reveal the answer of the given round and move on.
    RoundAdvance(usize),
    /// Flip back the face-up cards and pass the turn.
    TurnAdvance,
    /// Evict a finished room that nobody restarted.
    Teardown,
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerKey::RoundAdvance(round) => write!(f, "round-advance:{}", round),
            TimerKey::TurnAdvance => f.write_str("turn-advance"),
            TimerKey::Teardown => f.write_str("teardown"),
        }
    }
}
