//! Real-time game coordination server for Wortspiel word games.
//!
//! Rooms of four game types (duel, memory, word search, slots) are held in
//! memory and kept in sync with every connected client over WebSocket.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
