//! HTTP API response DTOs.

use serde::Serialize;

use crate::domain::{GameStatus, GameType};

/// Per game type overview returned by `GET /api/games`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummaryDto {
    pub game_type: GameType,
    pub rooms: usize,
    pub lobby_connections: usize,
}

/// Room summary returned by `GET /api/games/{game_type}/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub game_id: String,
    pub status: GameStatus,
    pub players: Vec<String>,
    pub host_id: Option<String>,
    pub max_players: usize,
    pub connections: usize,
    pub pending_timers: usize,
    pub created_at: String,
}
