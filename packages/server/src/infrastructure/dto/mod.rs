//! Data Transfer Objects (DTOs) for the game server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: inbound client messages and outbound events
//! - `http`: HTTP API response DTOs
//! - `conversion`: domain → DTO conversions

pub mod conversion;
pub mod http;
pub mod websocket;
