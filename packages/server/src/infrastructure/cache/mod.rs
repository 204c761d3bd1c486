//! Sync Cache の実装
//!
//! - `inmemory`: プロセス内の HashMap を使った TTL 付きキャッシュ

pub mod inmemory;

use std::time::Duration;

pub use inmemory::InMemorySyncCache;

/// クロックのデフォルトの有効期間（24 時間）
pub const DEFAULT_CLOCK_TTL: Duration = Duration::from_secs(24 * 60 * 60);
