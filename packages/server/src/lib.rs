//! Watch-party server library.
//!
//! Rooms are created over HTTP; members then open a WebSocket session, join
//! the room's channel, and follow the owner's playback clock while chatting.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod app;
pub mod config;
