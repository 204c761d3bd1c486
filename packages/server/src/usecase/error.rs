//! UseCase 層のエラー定義
//!
//! ドメイン層・外部サービスのエラーは、UseCase の境界でこの分類に変換します。
//! UI 層はこの分類だけを見て HTTP ステータスや `error` イベントに変換します。

use thiserror::Error;

use crate::domain::{
    AuthError, CacheError, ContentCatalogError, MessagePushError, PubSubError, RepositoryError,
    RoomError, ValueObjectError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Room is full (capacity: {capacity})")]
    Capacity { capacity: usize },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl UseCaseError {
    pub(crate) fn room_not_found() -> Self {
        Self::NotFound { resource: "Room" }
    }
}

impl From<RoomError> for UseCaseError {
    fn from(error: RoomError) -> Self {
        match error {
            // 終了したルームは参加・操作の対象として存在しないものとして扱う
            RoomError::Ended => Self::room_not_found(),
            RoomError::Full { capacity } => Self::Capacity { capacity },
            RoomError::NotOwner => Self::Forbidden(error.to_string()),
            RoomError::CannotKickOwner | RoomError::NotMember => {
                Self::BadRequest(error.to_string())
            }
        }
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { resource } => Self::NotFound { resource },
            RepositoryError::Rejected(room_error) => room_error.into(),
            RepositoryError::Conflict { .. } | RepositoryError::Unavailable(_) => {
                Self::StoreUnavailable(error.to_string())
            }
        }
    }
}

impl From<CacheError> for UseCaseError {
    fn from(error: CacheError) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<PubSubError> for UseCaseError {
    fn from(error: PubSubError) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<ContentCatalogError> for UseCaseError {
    fn from(error: ContentCatalogError) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<MessagePushError> for UseCaseError {
    fn from(error: MessagePushError) -> Self {
        match error {
            MessagePushError::ConnectionNotFound(_) => Self::NotFound {
                resource: "Connection",
            },
            MessagePushError::PushFailed(_) => Self::StoreUnavailable(error.to_string()),
        }
    }
}

impl From<ValueObjectError> for UseCaseError {
    fn from(error: ValueObjectError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<AuthError> for UseCaseError {
    fn from(error: AuthError) -> Self {
        Self::Unauthorized(error.to_string())
    }
}
