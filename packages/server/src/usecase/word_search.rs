//! Word search rules: every hidden word goes to whoever finds it first.

use std::sync::Arc;

use crate::{
    domain::{
        GameId, GameType, PlayerId,
        game::{GridCell, WordSearchState},
    },
    infrastructure::dto::{
        conversion::player_dtos,
        websocket::{
            OutboundMessage, RoomStateDto, WordFoundDto, WordSearchSeed, WordSearchStateDto, event,
        },
    },
};

use super::{
    coordinator::{Coordinator, GameRules, ensure_in_progress, ensure_seated, room_mut},
    error::GameError,
};

pub struct WordSearchGame;

pub type WordSearchCoordinator = Coordinator<WordSearchGame>;

impl GameRules for WordSearchGame {
    type State = WordSearchState;
    type Seed = WordSearchSeed;
    type Snapshot = WordSearchStateDto;

    const GAME_TYPE: GameType = GameType::WordSearch;

    fn init(seed: WordSearchSeed) -> WordSearchState {
        WordSearchState::new(seed.grid, seed.words)
    }

    fn has_content(state: &WordSearchState) -> bool {
        state.has_content()
    }

    fn reset(state: &mut WordSearchState) {
        state.reset();
    }

    fn snapshot(state: &WordSearchState) -> WordSearchStateDto {
        WordSearchStateDto {
            grid: Some(state.grid.clone()),
            words: Some(state.words.clone()),
            found: Some(state.found.clone()),
        }
    }
}

impl Coordinator<WordSearchGame> {
    /// Claim a word for a player; the game completes once every word is found.
    ///
    /// Unknown and already claimed words are rejected without any broadcast.
    pub async fn word_found(
        self: &Arc<Self>,
        game_id: &GameId,
        player_id: &PlayerId,
        word: &str,
        cells: Option<Vec<GridCell>>,
    ) -> Result<String, GameError> {
        let mut table = self.repository().lock().await;
        let room = room_mut(&mut table, game_id)?;
        ensure_in_progress(room)?;
        ensure_seated(room, player_id)?;

        let word = room.state.claim(player_id, word, cells.as_deref())?;
        if let Some(player) = room.player_mut(player_id) {
            player.score += 1;
        }
        tracing::debug!(
            "'{}' found '{}' in game '{}' ({}/{})",
            player_id,
            word,
            game_id,
            room.state.found_count(),
            room.state.words.len()
        );

        let notice = OutboundMessage::new(
            event::WORD_FOUND,
            WordFoundDto {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
                word: word.clone(),
                cells,
            },
        );
        self.broadcast(room, &notice).await?;

        let mut update = RoomStateDto::<WordSearchStateDto>::partial(game_id.clone());
        update.players = Some(player_dtos(room));
        update.game.found = Some(room.state.found.clone());
        self.broadcast_update(room, update).await?;

        if room.state.is_complete() {
            self.finish(room).await?;
        }
        Ok(word)
    }
}
