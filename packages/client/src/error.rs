//! Error types for the watch-party client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the access token
    #[error("Access token was rejected by the server")]
    Unauthorized,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
