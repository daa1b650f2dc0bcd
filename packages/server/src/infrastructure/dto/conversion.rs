//! Conversion logic from domain entities to DTOs.
//!
//! Inbound DTOs need no conversion: the value objects they carry are
//! validated by serde while decoding.

use wortspiel_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    Player, Room,
    game::{ConjugationPrompt, DuelWord, LastAnswer},
};
use crate::infrastructure::dto::{http::RoomSummaryDto, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Player> for dto::PlayerDto {
    fn from(model: &Player) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            score: model.score,
            ready: model.ready,
            is_host: model.is_host,
        }
    }
}

impl From<&LastAnswer> for dto::LastAnswerDto {
    fn from(model: &LastAnswer) -> Self {
        Self {
            player_id: model.player_id.clone(),
            answer: model.answer.clone(),
            correct: model.correct,
        }
    }
}

/// The expected answer is never sent to clients.
impl From<&DuelWord> for dto::DuelPromptDto {
    fn from(model: &DuelWord) -> Self {
        Self {
            word: model.word.clone(),
            translation: model.translation.clone(),
        }
    }
}

impl From<&ConjugationPrompt> for dto::SlotsPromptDto {
    fn from(model: &ConjugationPrompt) -> Self {
        Self {
            verb: model.verb.clone(),
            tense: model.tense.clone(),
            pronoun: model.pronoun.clone(),
        }
    }
}

/// Roster of a room in seating order.
pub fn player_dtos<S>(room: &Room<S>) -> Vec<dto::PlayerDto> {
    room.players.iter().map(dto::PlayerDto::from).collect()
}

/// Room-wide fields of a full snapshot; the game fields come from `game`.
pub fn full_room_state<S, T>(room: &Room<S>, game: T) -> dto::RoomStateDto<T> {
    dto::RoomStateDto {
        game_id: room.game_id.clone(),
        status: Some(room.status),
        players: Some(player_dtos(room)),
        host_id: Some(room.host_id.clone()),
        max_players: Some(room.max_players),
        winner: Some(winner_of(room)),
        game,
    }
}

/// Winner of a completed room; no winner is reported before completion.
fn winner_of<S>(room: &Room<S>) -> Option<crate::domain::PlayerId> {
    if room.status != crate::domain::GameStatus::Completed {
        return None;
    }
    room.winner().map(|p| p.id.clone())
}

pub fn room_summary<S>(room: &Room<S>, pending_timers: usize) -> RoomSummaryDto {
    RoomSummaryDto {
        game_id: room.game_id.to_string(),
        status: room.status,
        players: room.players.iter().map(|p| p.id.to_string()).collect(),
        host_id: room.host_id.as_ref().map(ToString::to_string),
        max_players: room.max_players,
        connections: room.connections.len(),
        pending_timers,
        created_at: timestamp_to_rfc3339(room.created_at.value()),
    }
}
