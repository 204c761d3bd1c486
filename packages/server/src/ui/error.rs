//! HTTP error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{domain::AuthError, infrastructure::dto::http::ErrorDto, usecase::UseCaseError};

/// Error returned by HTTP handlers and the auth extractor.
///
/// Rendered as `{"error": <kind>, "message": <detail>}` with the matching status code.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] UseCaseError);

impl ApiError {
    pub fn as_status_code(&self) -> StatusCode {
        match &self.0 {
            UseCaseError::NotFound { .. } => StatusCode::NOT_FOUND,
            UseCaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UseCaseError::Capacity { .. } | UseCaseError::BadRequest(_) => StatusCode::BAD_REQUEST,
            UseCaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UseCaseError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.0 {
            UseCaseError::NotFound { .. } => "not_found",
            UseCaseError::Forbidden(_) => "forbidden",
            UseCaseError::Capacity { .. } => "room_full",
            UseCaseError::BadRequest(_) => "bad_request",
            UseCaseError::Unauthorized(_) => "unauthorized",
            UseCaseError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(UseCaseError::from(error))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(UseCaseError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorDto {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
