//! Room ストアの実装
//!
//! - `inmemory`: HashMap を使ったインメモリ実装

pub mod inmemory;

pub use inmemory::{InMemoryRoomRepository, RoomTable};
