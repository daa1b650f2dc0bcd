//! Shared utilities for the Wortspiel workspace.

pub mod logger;
pub mod time;
