//! UseCase 層のエラー型
//!
//! どのエラーも致命的ではありません。Dispatcher がログに残して破棄し、
//! クライアントには何も返しません。

use thiserror::Error;

use crate::domain::{
    GameId, GameStatus, MessagePushError, PlayerId, RoomError,
    game::{MemoryError, RoundError, SlotsError, WordSearchError},
};

/// Coordinator が操作を拒否した理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("room '{0}' not found")]
    RoomNotFound(GameId),

    #[error("room '{game_id}' is {status}, not in progress")]
    NotInProgress { game_id: GameId, status: GameStatus },

    #[error("no active round")]
    NoActiveRound,

    #[error("submission for round {submitted} but round {current} is active")]
    StaleRound { submitted: usize, current: usize },

    #[error("round {0} has already timed out")]
    DuplicateTimeout(usize),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("the turn is being handed over")]
    TurnLocked,

    #[error("card {0} cannot be flipped")]
    InvalidCard(usize),

    #[error("'{0}' is not one of the hidden words")]
    UnknownWord(String),

    #[error("'{word}' was already found by {by}")]
    WordAlreadyClaimed { word: String, by: PlayerId },

    #[error("round {0} has not been spun yet")]
    NotSpun(usize),

    #[error("round {0} has already been spun")]
    AlreadySpun(usize),

    #[error("only the host may do this, not {0}")]
    NotHost(PlayerId),

    #[error("player '{0}' is not seated in the room")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    Transition(#[from] RoomError),

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] MessagePushError),
}

impl From<RoundError> for GameError {
    fn from(e: RoundError) -> Self {
        match e {
            RoundError::DuplicateTimeout(round) => GameError::DuplicateTimeout(round),
            RoundError::StaleRound { submitted, current } => {
                GameError::StaleRound { submitted, current }
            }
        }
    }
}

impl From<MemoryError> for GameError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::NotYourTurn(player_id) => GameError::NotYourTurn(player_id),
            MemoryError::TurnLocked => GameError::TurnLocked,
            MemoryError::InvalidCard(index) | MemoryError::CardUnavailable(index) => {
                GameError::InvalidCard(index)
            }
        }
    }
}

impl From<SlotsError> for GameError {
    fn from(e: SlotsError) -> Self {
        match e {
            SlotsError::AlreadySpun(round) => GameError::AlreadySpun(round),
            SlotsError::NotSpun(round) => GameError::NotSpun(round),
            SlotsError::NoPrompt(_) => GameError::NoActiveRound,
        }
    }
}

impl From<WordSearchError> for GameError {
    fn from(e: WordSearchError) -> Self {
        match e {
            WordSearchError::UnknownWord(word) | WordSearchError::PathMismatch(word) => {
                GameError::UnknownWord(word)
            }
            WordSearchError::AlreadyClaimed { word, by } => {
                GameError::WordAlreadyClaimed { word, by }
            }
        }
    }
}

/// Dispatcher が受信メッセージを処理できなかった理由
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("no identity for connection; send userId or connect with ?user_id=")]
    MissingIdentity,

    #[error(transparent)]
    Game(#[from] GameError),
}
