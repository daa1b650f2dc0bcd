//! UI 層
//!
//! WebSocket エンドポイントと参照用の HTTP API を提供します。

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
