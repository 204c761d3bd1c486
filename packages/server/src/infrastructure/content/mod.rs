//! コンテンツ参照の実装
//!
//! - `static_catalog`: 設定で与えた ID の一覧による実装

pub mod static_catalog;

pub use static_catalog::StaticContentCatalog;
