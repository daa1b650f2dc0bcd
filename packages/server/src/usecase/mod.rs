//! UseCase 層
//!
//! ゲーム種別ごとの Coordinator と、受信メッセージを振り分ける Dispatcher を提供します。
//! Coordinator は共通のルームライフサイクル（join / ready / leave / restart / 完了）を
//! [`GameRules`] でゲーム種別ごとに差し替えて実装します。

pub mod broadcast;
pub mod coordinator;
pub mod dispatcher;
pub mod duel;
pub mod error;
pub mod memory;
pub mod rounds;
pub mod slots;
pub mod word_search;

#[cfg(test)]
pub(crate) mod test_support;

pub use broadcast::Fanout;
pub use coordinator::{Coordinator, DEFAULT_MAX_PLAYERS, GameRules};
pub use dispatcher::Dispatcher;
pub use duel::{DuelCoordinator, DuelGame};
pub use error::{DispatchError, GameError};
pub use memory::{MemoryCoordinator, MemoryGame};
pub use rounds::RoundRules;
pub use slots::{SlotsCoordinator, SlotsGame};
pub use word_search::{WordSearchCoordinator, WordSearchGame};
