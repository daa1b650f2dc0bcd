//! Runtime configuration of the game server.

use std::time::Duration;

/// Delays of the scheduled room transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimings {
    /// How long a resolved round stays on screen before the next one
    pub answer_reveal_delay: Duration,
    /// How long two flipped memory cards stay face up
    pub turn_display_delay: Duration,
    /// How long a completed room survives without a restart
    pub completed_room_ttl: Duration,
}

impl GameTimings {
    pub const DEFAULT_ANSWER_REVEAL_MS: u64 = 2500;
    pub const DEFAULT_TURN_DISPLAY_MS: u64 = 1500;
    pub const DEFAULT_COMPLETED_ROOM_TTL_SECS: u64 = 300;

    pub fn new(answer_reveal_ms: u64, turn_display_ms: u64, completed_room_ttl_secs: u64) -> Self {
        Self {
            answer_reveal_delay: Duration::from_millis(answer_reveal_ms),
            turn_display_delay: Duration::from_millis(turn_display_ms),
            completed_room_ttl: Duration::from_secs(completed_room_ttl_secs),
        }
    }
}

impl Default for GameTimings {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_ANSWER_REVEAL_MS,
            Self::DEFAULT_TURN_DISPLAY_MS,
            Self::DEFAULT_COMPLETED_ROOM_TTL_SECS,
        )
    }
}
