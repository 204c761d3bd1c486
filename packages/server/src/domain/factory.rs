//! ID・招待コードの生成

use uuid::Uuid;

use super::{
    ConnectionId, InviteCode, RoomId,
    value_object::{INVITE_CODE_ALPHABET, INVITE_CODE_LEN},
};

/// RoomId を生成する Factory
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        RoomId::from_uuid(Uuid::new_v4())
    }
}

/// ConnectionId を生成する Factory
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(Uuid::new_v4())
    }
}

/// 招待コードを生成する Factory
///
/// UUID v4 の乱数部分をアルファベット 32 文字で 8 桁にエンコードする。
/// 一意性は Repository 側の重複チェックで保証する。
pub struct InviteCodeFactory;

impl InviteCodeFactory {
    pub fn generate() -> InviteCode {
        Self::from_seed(Uuid::new_v4().as_u128())
    }

    fn from_seed(mut seed: u128) -> InviteCode {
        let base = INVITE_CODE_ALPHABET.len() as u128;
        let mut code = String::with_capacity(INVITE_CODE_LEN);
        for _ in 0..INVITE_CODE_LEN {
            let index = (seed % base) as usize;
            code.push(char::from(INVITE_CODE_ALPHABET[index]));
            seed /= base;
        }
        InviteCode::from_generated(code)
    }
}

impl RoomId {
    fn from_uuid(uuid: Uuid) -> Self {
        Self::from_generated(uuid.simple().to_string())
    }
}

impl ConnectionId {
    fn from_uuid(uuid: Uuid) -> Self {
        Self::from_generated(uuid.simple().to_string())
    }
}
