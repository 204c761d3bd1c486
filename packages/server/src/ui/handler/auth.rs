//! Bearer-token authentication for HTTP routes and the WebSocket upgrade.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::{
    domain::{AuthClaims, AuthError},
    ui::{error::ApiError, state::AppState},
};

/// Verified caller, extracted from `Authorization: Bearer <token>`
/// or, for browser WebSocket clients, the `?token=` query parameter.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthClaims);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or(AuthError::MissingCredential)?;

        match state.token_verifier.verify(&token).await {
            Ok(claims) => Ok(Self(claims)),
            Err(e) => {
                tracing::warn!("Rejected credential for {}: {}", parts.uri.path(), e);
                Err(e.into())
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri).ok()?;
    query.token.filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_of(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_bearer_token_is_read_from_header() {
        // テスト項目: Authorization ヘッダの Bearer トークンを取り出せる
        // given (前提条件):
        let parts = parts_of(
            Request::builder()
                .uri("/rooms")
                .header(header::AUTHORIZATION, "Bearer abc.def")
                .body(())
                .unwrap(),
        );

        // when (操作):
        let token = bearer_token(&parts);

        // then (期待する結果):
        assert_eq!(token.as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        // テスト項目: Bearer 以外のスキームはトークンとして扱わない
        // given (前提条件):
        let parts = parts_of(
            Request::builder()
                .uri("/rooms")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(())
                .unwrap(),
        );

        // when (操作):
        let token = bearer_token(&parts);

        // then (期待する結果):
        assert_eq!(token, None);
    }

    #[test]
    fn test_query_token_fallback() {
        // テスト項目: クエリパラメータの token を取り出せる（空文字は無視）
        // given (前提条件):
        let with_token = parts_of(Request::builder().uri("/ws?token=xyz").body(()).unwrap());
        let empty = parts_of(Request::builder().uri("/ws?token=").body(()).unwrap());
        let missing = parts_of(Request::builder().uri("/ws").body(()).unwrap());

        // when (操作):
        let tokens = [
            query_token(&with_token),
            query_token(&empty),
            query_token(&missing),
        ];

        // then (期待する結果):
        assert_eq!(tokens, [Some("xyz".to_string()), None, None]);
    }
}
