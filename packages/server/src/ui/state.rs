//! Shared application state.

use std::sync::Arc;

use crate::usecase::Dispatcher;

/// Shared application state
pub struct AppState {
    /// Dispatcher（全ゲーム種別へのメッセージ振り分け）
    pub dispatcher: Arc<Dispatcher>,
}
