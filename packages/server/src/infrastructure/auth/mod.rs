//! 資格情報の検証の実装
//!
//! - `hmac`: HMAC-SHA256 で署名されたトークン

pub mod hmac;

pub use self::hmac::{HmacTokenVerifier, TokenClaims};
