//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, PlayerId},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// 接続全体で使うプレイヤー ID（省略時はメッセージごとの `userId` を使う）
    pub user_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match query.user_id {
        Some(raw) => match PlayerId::new(raw.clone()) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Invalid user_id '{}': {}", raw, e);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Forward everything queued for this connection to its socket.
///
/// # Arguments
///
/// * `rx` - Channel receiver fed by the `MessagePusher`
/// * `sender` - WebSocket sink to send messages to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Option<PlayerId>) {
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .dispatcher
        .connect(connection_id, identity, tx)
        .await;

    let (sender, mut receiver) = socket.split();

    // The receive task only forwards frames; they are dispatched here, on a
    // task that is never aborted mid-operation.
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if frame_tx.send(text.to_string()).is_err() {
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    loop {
        tokio::select! {
            biased;
            frame = frame_rx.recv() => match frame {
                Some(text) => state.dispatcher.route(&connection_id, &text).await,
                None => break,
            },
            _ = &mut send_task => break,
        }
    }
    recv_task.abort();
    send_task.abort();

    state.dispatcher.disconnect(&connection_id).await;
}
