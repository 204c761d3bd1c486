//! Utilities shared between the matinee server and client.

pub mod logger;
pub mod time;
