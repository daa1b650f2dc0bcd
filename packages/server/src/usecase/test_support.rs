//! Helpers shared by the usecase tests.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use wortspiel_shared::time::FixedClock;

use crate::{
    config::GameTimings,
    domain::{ConnectionId, GameId, MessagePusher, PlayerId},
    infrastructure::{
        dto::websocket::JoinPayload, message_pusher::WebSocketMessagePusher,
        registry::ConnectionRegistry, repository::InMemoryRoomRepository,
        scheduler::TransitionScheduler,
    },
};

use super::{
    broadcast::Fanout,
    coordinator::{Coordinator, GameRules},
    dispatcher::Dispatcher,
};

pub fn gid(value: &str) -> GameId {
    GameId::new(value.to_string()).unwrap()
}

pub fn pid(value: &str) -> PlayerId {
    PlayerId::new(value.to_string()).unwrap()
}

pub fn join_payload<T>(name: &str, content: T) -> JoinPayload<T> {
    JoinPayload {
        player_name: Some(name.to_string()),
        max_players: None,
        host_id: None,
        players: Vec::new(),
        content,
    }
}

/// A connection whose outbound messages land in a channel.
pub struct TestClient {
    pub connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
}

impl TestClient {
    /// Everything received since the last call, decoded.
    pub fn messages(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(text) = self.rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }

    pub fn of_type(&mut self, kind: &str) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|message| message["type"] == kind)
            .collect()
    }
}

/// Real pusher and registry, wired the way the server wires them.
pub struct Harness {
    pub pusher: Arc<WebSocketMessagePusher>,
    pub registry: Arc<ConnectionRegistry>,
    pub fanout: Arc<Fanout>,
}

impl Harness {
    pub fn new() -> Self {
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let fanout = Arc::new(Fanout::new(pusher.clone(), registry.clone()));
        Self {
            pusher,
            registry,
            fanout,
        }
    }

    pub fn coordinator<G: GameRules>(&self) -> Arc<Coordinator<G>> {
        Arc::new(Coordinator::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(TransitionScheduler::new()),
            self.fanout.clone(),
            self.registry.clone(),
            Arc::new(FixedClock::new(1_700_000_000_000)),
            GameTimings::default(),
        ))
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.registry.clone(),
            self.pusher.clone(),
            self.coordinator(),
            self.coordinator(),
            self.coordinator(),
            self.coordinator(),
        )
    }

    /// Register a connection with the pusher and the registry.
    pub async fn client(&self, identity: Option<&str>) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        self.pusher.register_client(connection_id, tx).await;
        self.registry.register(connection_id, identity.map(pid)).await;
        TestClient { connection_id, rx }
    }
}
