//! Watch-party CLI client.
//!
//! Follows the room owner's playback clock with a simulated local player and
//! relays chat and reactions typed at the prompt.

pub mod command;
pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
