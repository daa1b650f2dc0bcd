//! Dispatcher: decode inbound messages and route them to the coordinators.
//!
//! Nothing is ever sent back to the sender on failure; rejected and
//! undecodable messages are logged and dropped, and the connection stays open.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, GameId, GameType, MessagePusher, PlayerId, PusherChannel},
    infrastructure::{
        dto::{
            http::{GameSummaryDto, RoomSummaryDto},
            websocket::{ClientMessage, JoinPayload, KNOWN_MESSAGE_TYPES, RawEnvelope},
        },
        registry::ConnectionRegistry,
    },
};

use super::{
    coordinator::{Coordinator, GameRules},
    duel::{DuelCoordinator, DuelGame},
    error::{DispatchError, GameError},
    memory::{MemoryCoordinator, MemoryGame},
    slots::{SlotsCoordinator, SlotsGame},
    word_search::{WordSearchCoordinator, WordSearchGame},
};

pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    pusher: Arc<dyn MessagePusher>,
    duel: Arc<DuelCoordinator>,
    memory: Arc<MemoryCoordinator>,
    word_search: Arc<WordSearchCoordinator>,
    slots: Arc<SlotsCoordinator>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        pusher: Arc<dyn MessagePusher>,
        duel: Arc<DuelCoordinator>,
        memory: Arc<MemoryCoordinator>,
        word_search: Arc<WordSearchCoordinator>,
        slots: Arc<SlotsCoordinator>,
    ) -> Self {
        Self {
            registry,
            pusher,
            duel,
            memory,
            word_search,
            slots,
        }
    }

    /// Register a new connection and the channel its outbound messages go to.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        identity: Option<PlayerId>,
        sender: PusherChannel,
    ) {
        self.pusher.register_client(connection_id, sender).await;
        self.registry.register(connection_id, identity).await;
        tracing::info!("Connection '{}' registered", connection_id);
    }

    /// Forget a connection and leave every room it was in.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let membership = self.registry.unregister(connection_id).await;
        if let Some((game_type, game_id)) = membership.room
            && let Err(e) = self.leave_room(connection_id, game_type, &game_id).await
        {
            tracing::debug!(
                "Leaving game '{}' on disconnect of '{}': {}",
                game_id,
                connection_id,
                e
            );
        }
        self.pusher.unregister_client(connection_id).await;
        tracing::info!(
            "Connection '{}' ({}) unregistered",
            connection_id,
            membership
                .identity
                .as_ref()
                .map_or("anonymous", PlayerId::as_str)
        );
    }

    /// Handle one text frame, logging and dropping anything that fails.
    pub async fn route(&self, connection_id: &ConnectionId, text: &str) {
        match self.dispatch(connection_id, text).await {
            Ok(()) => {}
            Err(DispatchError::Game(e)) => {
                tracing::debug!("Rejected message from '{}': {}", connection_id, e)
            }
            Err(e) => tracing::warn!("Dropped message from '{}': {}", connection_id, e),
        }
    }

    /// Decode and execute one message.
    pub async fn dispatch(&self, connection_id: &ConnectionId, text: &str) -> Result<(), DispatchError> {
        let message = decode(text)?;
        tracing::debug!("Message from '{}': {:?}", connection_id, message);

        match message {
            ClientMessage::JoinLobby { game_type } => {
                self.registry.set_lobby(connection_id, game_type).await;
                tracing::debug!("Connection '{}' joined the {} lobby", connection_id, game_type);
            }

            // duel
            ClientMessage::JoinDuelGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.join(&self.duel, connection_id, game_id, &player_id, data)
                    .await?;
            }
            ClientMessage::DuelPlayerReady { game_id, user_id } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.duel.ready(&game_id, &player_id).await?;
            }
            ClientMessage::SubmitAnswer {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.duel
                    .submit_answer(&game_id, &player_id, &data.answer, data.is_timeout, data.round)
                    .await?;
            }
            ClientMessage::DuelRestartGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.duel.restart(&game_id, Some(&player_id), data).await?;
            }
            ClientMessage::DuelLeaveGame { game_id, .. } => {
                self.leave_room(connection_id, GameType::Duel, &game_id)
                    .await?;
            }

            // memory
            ClientMessage::JoinMemoryGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.join(&self.memory, connection_id, game_id, &player_id, data)
                    .await?;
            }
            ClientMessage::MemoryPlayerReady { game_id, user_id } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.memory.ready(&game_id, &player_id).await?;
            }
            ClientMessage::FlipCard {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.memory
                    .flip_card(&game_id, &player_id, data.card_index)
                    .await?;
            }
            ClientMessage::MemoryRestartGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.memory.restart(&game_id, Some(&player_id), data).await?;
            }
            ClientMessage::MemoryLeaveGame { game_id, .. } => {
                self.leave_room(connection_id, GameType::Memory, &game_id)
                    .await?;
            }

            // word search
            ClientMessage::JoinWordsearchGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.join(&self.word_search, connection_id, game_id, &player_id, data)
                    .await?;
            }
            ClientMessage::WordsearchPlayerReady { game_id, user_id } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.word_search.ready(&game_id, &player_id).await?;
            }
            ClientMessage::WordFound {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.word_search
                    .word_found(&game_id, &player_id, &data.word, data.cells)
                    .await?;
            }
            ClientMessage::WordsearchRestartGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.word_search
                    .restart(&game_id, Some(&player_id), data)
                    .await?;
            }
            ClientMessage::WordsearchLeaveGame { game_id, .. } => {
                self.leave_room(connection_id, GameType::WordSearch, &game_id)
                    .await?;
            }

            // slots
            ClientMessage::JoinSlotsGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.join(&self.slots, connection_id, game_id, &player_id, data)
                    .await?;
            }
            ClientMessage::SlotsPlayerReady { game_id, user_id } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.slots.ready(&game_id, &player_id).await?;
            }
            ClientMessage::StartSpin { game_id, user_id } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.slots.start_spin(&game_id, &player_id).await?;
            }
            ClientMessage::SlotsSubmitAnswer {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.slots
                    .submit_answer(&game_id, &player_id, &data.answer, data.is_timeout, data.round)
                    .await?;
            }
            ClientMessage::SlotsRestartGame {
                game_id,
                user_id,
                data,
            } => {
                let player_id = self.identity(connection_id, user_id).await?;
                self.slots.restart(&game_id, Some(&player_id), data).await?;
            }
            ClientMessage::SlotsLeaveGame { game_id, .. } => {
                self.leave_room(connection_id, GameType::Slots, &game_id)
                    .await?;
            }
        }
        Ok(())
    }

    /// Identity a message acts as: its `userId`, else the connection's own.
    async fn identity(
        &self,
        connection_id: &ConnectionId,
        user_id: Option<PlayerId>,
    ) -> Result<PlayerId, DispatchError> {
        match user_id {
            Some(player_id) => {
                self.registry
                    .remember_identity(connection_id, &player_id)
                    .await;
                Ok(player_id)
            }
            None => self
                .registry
                .identity(connection_id)
                .await
                .ok_or(DispatchError::MissingIdentity),
        }
    }

    /// Join a room, leaving the room the connection played in before.
    async fn join<G: GameRules>(
        &self,
        coordinator: &Arc<Coordinator<G>>,
        connection_id: &ConnectionId,
        game_id: GameId,
        player_id: &PlayerId,
        data: JoinPayload<G::Seed>,
    ) -> Result<(), GameError> {
        for (game_type, previous) in self.registry.rooms_containing(connection_id).await {
            if game_type != G::GAME_TYPE || previous != game_id {
                tracing::debug!(
                    "Connection '{}' moves from game '{}' to '{}'",
                    connection_id,
                    previous,
                    game_id
                );
                if let Err(e) = self.leave_room(connection_id, game_type, &previous).await {
                    tracing::debug!("Leaving previous game '{}': {}", previous, e);
                }
            }
        }

        coordinator
            .join(*connection_id, &game_id, player_id, data)
            .await?;
        self.registry
            .enter_room(connection_id, G::GAME_TYPE, &game_id)
            .await;
        Ok(())
    }

    async fn leave_room(
        &self,
        connection_id: &ConnectionId,
        game_type: GameType,
        game_id: &GameId,
    ) -> Result<(), GameError> {
        self.registry
            .exit_room(connection_id, game_type, game_id)
            .await;
        match game_type {
            GameType::Duel => self.duel.leave(connection_id, game_id).await?,
            GameType::Memory => self.memory.leave(connection_id, game_id).await?,
            GameType::WordSearch => self.word_search.leave(connection_id, game_id).await?,
            GameType::Slots => self.slots.leave(connection_id, game_id).await?,
        };
        Ok(())
    }

    /// Per game type overview for the HTTP API.
    pub async fn game_summaries(&self) -> Vec<GameSummaryDto> {
        let mut summaries = Vec::with_capacity(GameType::ALL.len());
        for game_type in GameType::ALL {
            let rooms = match game_type {
                GameType::Duel => self.duel.count_rooms().await,
                GameType::Memory => self.memory.count_rooms().await,
                GameType::WordSearch => self.word_search.count_rooms().await,
                GameType::Slots => self.slots.count_rooms().await,
            };
            summaries.push(GameSummaryDto {
                game_type,
                rooms,
                lobby_connections: self.registry.lobby_members(game_type).await.len(),
            });
        }
        summaries
    }

    pub async fn room_summaries(&self, game_type: GameType) -> Vec<RoomSummaryDto> {
        match game_type {
            GameType::Duel => self.duel.room_summaries().await,
            GameType::Memory => self.memory.room_summaries().await,
            GameType::WordSearch => self.word_search.room_summaries().await,
            GameType::Slots => self.slots.room_summaries().await,
        }
    }

    pub async fn count_connections(&self) -> usize {
        self.registry.count_connections().await
    }
}

/// Decode a frame, telling unknown message types apart from broken ones.
fn decode(text: &str) -> Result<ClientMessage, DispatchError> {
    serde_json::from_str::<ClientMessage>(text).map_err(|e| {
        match serde_json::from_str::<RawEnvelope>(text) {
            Ok(raw) if !KNOWN_MESSAGE_TYPES.contains(&raw.kind.as_str()) => {
                DispatchError::UnknownType(raw.kind)
            }
            _ => DispatchError::Malformed(e),
        }
    })
}
