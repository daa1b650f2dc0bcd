//! ドメイン層
//!
//! ゲームルームの状態、プレイヤー、各ゲーム種別のルールを定義します。
//! このモジュールは I/O を一切持たず、Infrastructure 層や UseCase 層から利用されます。

pub mod entity;
pub mod error;
pub mod game;
pub mod message_pusher;
pub mod timer;
pub mod value_object;

pub use entity::{Departure, Player, PlayerAdmission, Room};
pub use error::{MessagePushError, RoomError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use timer::TimerKey;
pub use value_object::{ConnectionId, GameId, GameStatus, GameType, PlayerId, Timestamp};
