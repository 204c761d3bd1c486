//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装と、ワイヤー形式（DTO）を提供します。

pub mod auth;
pub mod cache;
pub mod content;
pub mod dto;
pub mod message_pusher;
pub mod pubsub;
pub mod repository;
