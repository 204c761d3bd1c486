//! Room Repository の実装
//!
//! - `inmemory`: プロセス内の HashMap を使った実装

pub mod inmemory;

pub use inmemory::InMemoryRoomRepository;
