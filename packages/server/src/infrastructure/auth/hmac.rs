//! HMAC-SHA256 署名付きトークンの検証
//!
//! トークンの形式: `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, 前半部分))`
//!
//! claims は `{"sub": <ユーザー ID>, "role": <ロール>, "exp": <有効期限（Unix 秒、省略可）>}`。
//! 署名の発行は外部の資格情報サービスの責務ですが、テストと開発用に `sign` も提供します。

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use matinee_shared::time::Clock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::{AuthClaims, AuthError, TokenVerifier, UserId};

type HmacSha256 = Hmac<Sha256>;

/// トークンに埋め込む claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// HMAC-SHA256 署名付きトークンの検証器
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            clock,
        }
    }

    /// claims に署名してトークンを発行する
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", encoded, signature))
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::InvalidSignature)
    }
}

#[async_trait]
impl TokenVerifier for HmacTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let (encoded, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;

        if let Some(exp) = claims.exp
            && exp.saturating_mul(1000) <= self.clock.now_millis()
        {
            return Err(AuthError::Expired);
        }

        let user_id = UserId::new(claims.sub).map_err(|_| AuthError::Malformed)?;
        Ok(AuthClaims {
            user_id,
            role: claims.role,
        })
    }
}
