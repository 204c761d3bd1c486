//! 設定で与えたコンテンツ ID の一覧による ContentCatalog 実装
//!
//! 一覧が空の場合は、どのコンテンツ ID も存在するものとして扱います（開発用）。

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{ContentCatalog, ContentCatalogError, ContentId};

pub struct StaticContentCatalog {
    known: HashSet<ContentId>,
}

impl StaticContentCatalog {
    pub fn new(known: Vec<ContentId>) -> Self {
        Self {
            known: known.into_iter().collect(),
        }
    }

    /// すべてのコンテンツ ID を受け付けるカタログ
    pub fn accept_any() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ContentCatalog for StaticContentCatalog {
    async fn exists(&self, content_id: &ContentId) -> Result<bool, ContentCatalogError> {
        Ok(self.known.is_empty() || self.known.contains(content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(id: &str) -> ContentId {
        ContentId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_known_content_only() {
        // テスト項目: 一覧にあるコンテンツだけが存在する
        // given (前提条件):
        let catalog = StaticContentCatalog::new(vec![content("m1"), content("m2")]);

        // when (操作):
        let known = catalog.exists(&content("m1")).await;
        let unknown = catalog.exists(&content("m3")).await;

        // then (期待する結果):
        assert_eq!(known, Ok(true));
        assert_eq!(unknown, Ok(false));
    }

    #[tokio::test]
    async fn test_empty_catalog_accepts_any() {
        // テスト項目: 一覧が空ならどのコンテンツも存在するものとして扱う
        // given (前提条件):
        let catalog = StaticContentCatalog::accept_any();

        // when (操作):
        let result = catalog.exists(&content("anything")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(true));
    }
}
