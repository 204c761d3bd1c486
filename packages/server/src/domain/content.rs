//! コンテンツ参照（外部のメタデータサービス）のインターフェース

use async_trait::async_trait;

use super::{ContentCatalogError, ContentId};

/// ルーム作成時にコンテンツ ID の存在を確認する
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    async fn exists(&self, content_id: &ContentId) -> Result<bool, ContentCatalogError>;
}
