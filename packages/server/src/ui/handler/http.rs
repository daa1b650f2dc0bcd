//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::GameType,
    infrastructure::dto::http::{GameSummaryDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// One summary per game type
pub async fn get_games(State(state): State<Arc<AppState>>) -> Json<Vec<GameSummaryDto>> {
    Json(state.dispatcher.game_summaries().await)
}

/// Rooms of one game type
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    Path(game_type): Path<String>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    let game_type = game_type.parse::<GameType>().map_err(|_| {
        tracing::debug!("Unknown game type '{}' requested", game_type);
        StatusCode::NOT_FOUND
    })?;
    Ok(Json(state.dispatcher.room_summaries(game_type).await))
}
