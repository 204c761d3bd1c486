//! 認証（外部の資格情報発行サービス）のインターフェース
//!
//! HTTP API と WebSocket 接続の両方で同じ検証器を使います。

use async_trait::async_trait;

use super::{AuthError, UserId};

/// 検証済みの資格情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClaims {
    pub user_id: UserId,
    pub role: String,
}

/// 署名付きトークンを検証する
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError>;
}
