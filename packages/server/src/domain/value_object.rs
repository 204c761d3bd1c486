//! 値オブジェクト
//!
//! 不変条件を型で表現し、生成時に検証します。
//! 生成に成功した値オブジェクトは常に有効な状態です。

use super::error::ValueObjectError;

/// チャットメッセージ本文の最大文字数（サーバー側で強制）
pub const MAX_MESSAGE_CHARS: usize = 500;

/// リアクション（絵文字トークン）の最大文字数
pub const MAX_EMOJI_CHARS: usize = 32;

/// ルーム定員の下限
pub const MIN_ROOM_CAPACITY: usize = 2;

/// ルーム定員の上限
pub const MAX_ROOM_CAPACITY: usize = 10;

/// 招待コードの長さ
pub const INVITE_CODE_LEN: usize = 8;

/// 招待コードに使う文字（紛らわしい 0/O/1/I を除外）
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const MAX_IDENTIFIER_CHARS: usize = 64;
const MAX_CONTENT_ID_CHARS: usize = 128;

fn validate_identifier(
    value: &str,
    max_chars: usize,
    kind: &'static str,
) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    if value.chars().count() > max_chars {
        return Err(ValueObjectError::TooLong {
            kind,
            max: max_chars,
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValueObjectError::InvalidCharacter(kind));
    }
    Ok(())
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $max:expr, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_identifier(&value, $max, $kind)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// ユーザー ID（認証済みトークンの subject）
    UserId,
    MAX_IDENTIFIER_CHARS,
    "user id"
);

string_identifier!(
    /// ルーム ID
    RoomId,
    MAX_IDENTIFIER_CHARS,
    "room id"
);

string_identifier!(
    /// WebSocket 接続 ID（プロセス内で一意）
    ConnectionId,
    MAX_IDENTIFIER_CHARS,
    "connection id"
);

string_identifier!(
    /// 視聴するコンテンツの ID（外部のメタデータサービスが管理）
    ContentId,
    MAX_CONTENT_ID_CHARS,
    "content id"
);

/// 招待コード
///
/// 8 文字、`INVITE_CODE_ALPHABET` の文字のみ。入力は大文字に正規化されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InviteCode(String);

impl InviteCode {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized.len() != INVITE_CODE_LEN {
            return Err(ValueObjectError::InvalidLength {
                kind: "invite code",
                expected: INVITE_CODE_LEN,
            });
        }
        if !normalized.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b)) {
            return Err(ValueObjectError::InvalidCharacter("invite code"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for InviteCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl RoomId {
    /// Factory が生成した検証済みの値から作る
    pub(super) fn from_generated(value: String) -> Self {
        Self(value)
    }
}

impl ConnectionId {
    /// Factory が生成した検証済みの値から作る
    pub(super) fn from_generated(value: String) -> Self {
        Self(value)
    }
}

impl InviteCode {
    /// Factory が生成した検証済みの値から作る
    pub(super) fn from_generated(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for InviteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム定員（2..=10）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomCapacity(usize);

impl RoomCapacity {
    pub fn new(value: usize) -> Result<Self, ValueObjectError> {
        if !(MIN_ROOM_CAPACITY..=MAX_ROOM_CAPACITY).contains(&value) {
            return Err(ValueObjectError::OutOfRange {
                kind: "max members",
                min: MIN_ROOM_CAPACITY as i64,
                max: MAX_ROOM_CAPACITY as i64,
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl Default for RoomCapacity {
    fn default() -> Self {
        Self(MAX_ROOM_CAPACITY)
    }
}

/// 再生位置（秒）
///
/// 有限かつ 0 以上。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PlaybackOffset(f64);

impl PlaybackOffset {
    pub const ZERO: Self = Self(0.0);

    pub fn new(seconds: f64) -> Result<Self, ValueObjectError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ValueObjectError::InvalidOffset(seconds));
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

/// チャットメッセージ本文
///
/// クライアント側の検証に関係なく、サーバー側で `MAX_MESSAGE_CHARS` 文字に切り詰めます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// 本文を生成する。長すぎる本文はエラーにせず切り詰める。
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("message"));
        }
        let text = match value.char_indices().nth(MAX_MESSAGE_CHARS) {
            Some((byte_index, _)) => value[..byte_index].to_string(),
            None => value,
        };
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// リアクション用の絵文字トークン（例: "🎉", ":laugh:"）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiToken(String);

impl EmojiToken {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier(&value, MAX_EMOJI_CHARS, "emoji")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for EmojiToken {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（UTC、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
