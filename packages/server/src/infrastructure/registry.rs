//! Connection registry: which live connections exist, which lobby each one
//! listens to and which room it plays in.
//!
//! Room membership is also tracked per room by each coordinator; the registry
//! keeps the reverse index so a disconnect can be cleaned up without scanning
//! every room.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, GameId, GameType, PlayerId};

/// Memberships a connection held when it was unregistered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub identity: Option<PlayerId>,
    pub lobby: Option<GameType>,
    pub room: Option<(GameType, GameId)>,
}

#[derive(Debug, Default)]
struct Inner {
    connections: HashMap<ConnectionId, Membership>,
    lobbies: HashMap<GameType, BTreeSet<ConnectionId>>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: ConnectionId, identity: Option<PlayerId>) {
        let mut inner = self.inner.lock().await;
        inner.connections.insert(
            connection_id,
            Membership {
                identity,
                ..Membership::default()
            },
        );
    }

    /// Forget a connection and return what it belonged to.
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Membership {
        let mut inner = self.inner.lock().await;
        let membership = inner.connections.remove(connection_id).unwrap_or_default();
        if let Some(game_type) = membership.lobby
            && let Some(members) = inner.lobbies.get_mut(&game_type)
        {
            members.remove(connection_id);
        }
        membership
    }

    pub async fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.inner.lock().await.connections.contains_key(connection_id)
    }

    pub async fn identity(&self, connection_id: &ConnectionId) -> Option<PlayerId> {
        let inner = self.inner.lock().await;
        inner.connections.get(connection_id)?.identity.clone()
    }

    /// Record the identity a connection announced, if it had none yet.
    pub async fn remember_identity(&self, connection_id: &ConnectionId, player_id: &PlayerId) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.connections.get_mut(connection_id)
            && entry.identity.is_none()
        {
            entry.identity = Some(player_id.clone());
        }
    }

    /// Move a connection into the lobby of `game_type`, leaving any other lobby.
    ///
    /// Returns `false` for an unknown connection.
    pub async fn set_lobby(&self, connection_id: &ConnectionId, game_type: GameType) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.connections.get_mut(connection_id) else {
            return false;
        };
        let previous = entry.lobby.replace(game_type);

        if let Some(previous) = previous
            && let Some(members) = inner.lobbies.get_mut(&previous)
        {
            members.remove(connection_id);
        }
        inner
            .lobbies
            .entry(game_type)
            .or_default()
            .insert(*connection_id);
        true
    }

    pub async fn lobby_members(&self, game_type: GameType) -> Vec<ConnectionId> {
        let inner = self.inner.lock().await;
        inner
            .lobbies
            .get(&game_type)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Record that a connection joined a room.
    ///
    /// A connection plays in at most one room; the previous membership is
    /// returned so the caller can leave it.
    pub async fn enter_room(
        &self,
        connection_id: &ConnectionId,
        game_type: GameType,
        game_id: &GameId,
    ) -> Option<(GameType, GameId)> {
        let mut inner = self.inner.lock().await;
        let entry = inner.connections.get_mut(connection_id)?;
        let next = (game_type, game_id.clone());
        match entry.room.replace(next.clone()) {
            Some(previous) if previous != next => Some(previous),
            _ => None,
        }
    }

    /// Clear a room membership if it is the one recorded.
    pub async fn exit_room(&self, connection_id: &ConnectionId, game_type: GameType, game_id: &GameId) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.connections.get_mut(connection_id)
            && entry
                .room
                .as_ref()
                .is_some_and(|(t, id)| *t == game_type && id == game_id)
        {
            entry.room = None;
        }
    }

    pub async fn rooms_containing(&self, connection_id: &ConnectionId) -> Vec<(GameType, GameId)> {
        let inner = self.inner.lock().await;
        inner
            .connections
            .get(connection_id)
            .and_then(|entry| entry.room.clone())
            .into_iter()
            .collect()
    }

    pub async fn count_connections(&self) -> usize {
        self.inner.lock().await.connections.len()
    }
}
