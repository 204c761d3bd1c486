//! Pub/Sub の実装
//!
//! - `local`: 単一プロセス用の `tokio::sync::broadcast` を使った実装

pub mod local;

pub use local::LocalRoomPubSub;
