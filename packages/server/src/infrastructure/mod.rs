//! Infrastructure 層
//!
//! ドメイン層・UseCase 層が必要とする状態保持と I/O の具体的な実装を提供します。

pub mod dto;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod scheduler;
