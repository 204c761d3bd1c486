//! Request handlers.

pub mod auth;
pub mod http;
pub mod websocket;

pub use auth::AuthUser;
pub use http::{create_room, get_room, health_check, join_room, leave_room, list_rooms};
pub use websocket::websocket_handler;
