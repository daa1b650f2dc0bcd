//! Broadcast/Fanout: serialize an outbound message once and deliver it.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::{ConnectionId, GameType, MessagePushError, MessagePusher},
    infrastructure::{dto::websocket::OutboundMessage, registry::ConnectionRegistry},
};

use super::error::GameError;

pub struct Fanout {
    pusher: Arc<dyn MessagePusher>,
    registry: Arc<ConnectionRegistry>,
}

impl Fanout {
    pub fn new(pusher: Arc<dyn MessagePusher>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { pusher, registry }
    }

    /// Send to every target; unreachable targets are skipped by the pusher.
    pub async fn to_connections<T: Serialize>(
        &self,
        targets: &[ConnectionId],
        message: &OutboundMessage<T>,
    ) -> Result<(), GameError> {
        if targets.is_empty() {
            return Ok(());
        }
        let content = encode(message)?;
        self.pusher.broadcast(targets, &content).await?;
        tracing::debug!(
            "Broadcasted '{}' to {} connection(s)",
            message.r#type,
            targets.len()
        );
        Ok(())
    }

    /// Send a room-created or room-ended notice to a lobby.
    pub async fn to_lobby<T: Serialize>(
        &self,
        game_type: GameType,
        message: &OutboundMessage<T>,
    ) -> Result<(), GameError> {
        let members = self.registry.lobby_members(game_type).await;
        self.to_connections(&members, message).await
    }
}

fn encode<T: Serialize>(message: &OutboundMessage<T>) -> Result<String, MessagePushError> {
    serde_json::to_string(message)
        .map_err(|e| MessagePushError::PushFailed(format!("cannot serialize '{}': {}", message.r#type, e)))
}
