//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時の検証エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{kind} must be at most {max} characters")]
    TooLong { kind: &'static str, max: usize },
    #[error("{kind} must be exactly {expected} characters")]
    InvalidLength { kind: &'static str, expected: usize },
    #[error("{0} contains invalid characters")]
    InvalidCharacter(&'static str),
    #[error("{kind} must be between {min} and {max}")]
    OutOfRange {
        kind: &'static str,
        min: i64,
        max: i64,
    },
    #[error("playback offset must be a finite, non-negative number of seconds (got {0})")]
    InvalidOffset(f64),
}

/// Room エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room has ended")]
    Ended,
    #[error("Room is full (capacity: {capacity})")]
    Full { capacity: usize },
    #[error("Only the room owner can do this")]
    NotOwner,
    #[error("The room owner cannot be kicked")]
    CannotKickOwner,
    #[error("User is not a member of this room")]
    NotMember,
}

/// Repository（永続ストア）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    /// 操作がドメインの不変条件により拒否された
    #[error(transparent)]
    Rejected(#[from] RoomError),
    #[error("Room store unavailable: {0}")]
    Unavailable(String),
}

/// Sync Cache（揮発性ストア）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Sync cache unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// Pub/Sub（プロセス間ファンアウト）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PubSubError {
    #[error("Failed to publish to room '{room_id}': {reason}")]
    PublishFailed { room_id: String, reason: String },
}

/// 認証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,
    #[error("Malformed credential")]
    Malformed,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Credential expired")]
    Expired,
}

/// コンテンツ参照サービスのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentCatalogError {
    #[error("Content catalog unavailable: {0}")]
    Unavailable(String),
}
