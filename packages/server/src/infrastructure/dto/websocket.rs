//! WebSocket message DTOs.
//!
//! Inbound messages are a single tagged union keyed by `type`; anything that
//! does not decode into [`ClientMessage`] is dropped by the dispatcher.
//! Outbound messages are `{ "type": ..., "data": ... }` envelopes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{
    GameId, GameStatus, GameType, PlayerId,
    game::{ConjugationPrompt, DuelWord, GridCell, MemoryCard},
};

// ========================================
// Inbound
// ========================================

/// Every message a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinLobby {
        game_type: GameType,
    },

    // duel
    JoinDuelGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: JoinPayload<DuelSeed>,
    },
    DuelPlayerReady {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
    SubmitAnswer {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: AnswerPayload,
    },
    DuelRestartGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: Option<DuelSeed>,
    },
    DuelLeaveGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },

    // memory
    JoinMemoryGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: JoinPayload<MemorySeed>,
    },
    MemoryPlayerReady {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
    FlipCard {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: FlipPayload,
    },
    MemoryRestartGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: Option<MemorySeed>,
    },
    MemoryLeaveGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },

    // word search
    JoinWordsearchGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: JoinPayload<WordSearchSeed>,
    },
    WordsearchPlayerReady {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
    WordFound {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: WordFoundPayload,
    },
    WordsearchRestartGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: Option<WordSearchSeed>,
    },
    WordsearchLeaveGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },

    // slots
    JoinSlotsGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: JoinPayload<SlotsSeed>,
    },
    SlotsPlayerReady {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
    StartSpin {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
    SlotsSubmitAnswer {
        game_id: GameId,
        user_id: Option<PlayerId>,
        #[serde(default)]
        data: AnswerPayload,
    },
    SlotsRestartGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
        data: Option<SlotsSeed>,
    },
    SlotsLeaveGame {
        game_id: GameId,
        user_id: Option<PlayerId>,
    },
}

/// Just enough of a message to name it in logs when full decoding fails.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Wire names of every message type [`ClientMessage`] understands.
pub const KNOWN_MESSAGE_TYPES: &[&str] = &[
    "join_lobby",
    "join_duel_game",
    "duel_player_ready",
    "submit_answer",
    "duel_restart_game",
    "duel_leave_game",
    "join_memory_game",
    "memory_player_ready",
    "flip_card",
    "memory_restart_game",
    "memory_leave_game",
    "join_wordsearch_game",
    "wordsearch_player_ready",
    "word_found",
    "wordsearch_restart_game",
    "wordsearch_leave_game",
    "join_slots_game",
    "slots_player_ready",
    "start_spin",
    "slots_submit_answer",
    "slots_restart_game",
    "slots_leave_game",
];

/// Player as listed in a join payload roster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    pub name: String,
}

/// Room creation data supplied with a join message.
///
/// Only used when the room does not exist yet, except for `player_name`,
/// which names the joining player.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload<T> {
    pub player_name: Option<String>,
    pub max_players: Option<usize>,
    pub host_id: Option<PlayerId>,
    #[serde(default)]
    pub players: Vec<PlayerSeed>,
    #[serde(flatten)]
    pub content: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DuelSeed {
    pub words: Vec<DuelWord>,
    pub total_rounds: Option<usize>,
    pub round_time_limit_secs: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlotsSeed {
    pub prompts: Vec<ConjugationPrompt>,
    pub total_rounds: Option<usize>,
    pub round_time_limit_secs: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemorySeed {
    pub cards: Vec<MemoryCard>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordSearchSeed {
    pub grid: Vec<String>,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnswerPayload {
    pub answer: String,
    pub is_timeout: bool,
    /// Round the client answered; lets late submissions be recognized
    pub round: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipPayload {
    pub card_index: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFoundPayload {
    pub word: String,
    #[serde(default)]
    pub cells: Option<Vec<GridCell>>,
}

// ========================================
// Outbound
// ========================================

/// Envelope of every message the server sends.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage<T> {
    pub r#type: String,
    pub data: T,
}

impl<T: Serialize> OutboundMessage<T> {
    pub fn new(kind: impl Into<String>, data: T) -> Self {
        Self {
            r#type: kind.into(),
            data,
        }
    }

    pub fn state_updated(game_type: GameType, data: T) -> Self {
        Self::new(game_type.state_updated_event(), data)
    }
}

pub mod event {
    //! Names of point events.

    pub const PLAYER_READY: &str = "player_ready";
    pub const ANSWER_SUBMITTED: &str = "answer_submitted";
    pub const SPIN_RESULT: &str = "spin_result";
    pub const CARD_FLIPPED: &str = "card_flipped";
    pub const WORD_FOUND: &str = "word_found";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub ready: bool,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAnswerDto {
    pub player_id: PlayerId,
    pub answer: String,
    pub correct: bool,
}

/// Full or partial room state; `None` fields are omitted and clients merge
/// shallowly. `Some(None)` serializes as an explicit `null` to clear a field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateDto<T> {
    pub game_id: GameId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<Option<PlayerId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Option<PlayerId>>,
    #[serde(flatten)]
    pub game: T,
}

impl<T: Default> RoomStateDto<T> {
    /// An update carrying nothing but the game id.
    pub fn partial(game_id: GameId) -> Self {
        Self {
            game_id,
            status: None,
            players: None,
            host_id: None,
            max_players: None,
            winner: None,
            game: T::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelPromptDto {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelStateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_time_limit_secs: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_word: Option<Option<DuelPromptDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_answer: Option<Option<LastAnswerDto>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsPromptDto {
    pub verb: String,
    pub tense: String,
    pub pronoun: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsStateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_time_limit_secs: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spun: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_prompt: Option<Option<SlotsPromptDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_answer: Option<Option<LastAnswerDto>>,
}

/// A card as clients see it; the face is hidden unless it is up or matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub index: usize,
    pub face: Option<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_up: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<Option<PlayerId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves: Option<BTreeMap<PlayerId, u32>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSearchStateDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<BTreeMap<PlayerId, BTreeSet<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerReadyDto {
    pub game_id: GameId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmittedDto {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub round: usize,
    pub prompt: String,
    pub answer: String,
    pub correct: bool,
    pub scored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResultDto {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub round: usize,
    #[serde(flatten)]
    pub prompt: SlotsPromptDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFlippedDto {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub card_index: usize,
    pub face: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFoundDto {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<GridCell>>,
}

/// Lobby notice for a newly created room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCreatedDto {
    pub game_id: GameId,
    pub host_id: Option<PlayerId>,
    pub max_players: usize,
    pub players: usize,
}

/// Lobby notice for a destroyed room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEndedDto {
    pub game_id: GameId,
}
