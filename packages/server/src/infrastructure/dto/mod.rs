//! Data Transfer Objects (DTOs) for the watch-party API.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (client and server events)
//! - `http`: HTTP API request/response DTOs
//!
//! Both server and client use these types, so the wire format is defined once.

pub mod conversion;
pub mod http;
pub mod websocket;
