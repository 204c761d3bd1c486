//! ドメイン層
//!
//! ビジネスルールと、外部サービスへのインターフェース（trait）を定義します。

pub mod auth;
pub mod content;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod pubsub;
pub mod repository;
pub mod sync_cache;
pub mod value_object;

pub use auth::{AuthClaims, TokenVerifier};
pub use content::ContentCatalog;
pub use entity::{
    ChatMessage, Departure, MembershipChange, PlaybackCommand, Reaction, Room, RoomStatus,
    SyncClock,
};
pub use error::{
    AuthError, CacheError, ContentCatalogError, MessagePushError, PubSubError, RepositoryError,
    RoomError, ValueObjectError,
};
pub use event::RoomEvent;
pub use factory::{ConnectionIdFactory, InviteCodeFactory, RoomIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use pubsub::{Delivery, PubSubMessage, RoomBroadcast, RoomPubSub};
pub use repository::RoomRepository;
pub use sync_cache::SyncCache;
pub use value_object::{
    ConnectionId, ContentId, EmojiToken, InviteCode, MessageText, PlaybackOffset, RoomCapacity,
    RoomId, Timestamp, UserId,
};

#[cfg(test)]
pub use pubsub::MockRoomPubSub;
#[cfg(test)]
pub use repository::MockRoomRepository;
#[cfg(test)]
pub use sync_cache::MockSyncCache;
