//! UI 層（HTTP API と WebSocket のエントリーポイント）

pub mod error;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use error::ApiError;
pub use server::{Server, build_router};
pub use state::AppState;
