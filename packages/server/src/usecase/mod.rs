//! UseCase 層
//!
//! 1 つの操作につき 1 つの UseCase を定義します。依存する外部サービスはすべて
//! ドメイン層の trait（`Arc<dyn Trait>`）として受け取ります。

pub mod create_room;
pub mod deliver_broadcast;
pub mod disconnect;
pub mod error;
pub mod get_room;
pub mod join_channel;
pub mod join_room;
pub mod kick_member;
pub mod leave_room;
pub mod list_rooms;
pub mod playback_control;
pub mod relay_event;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod fixtures;

use std::{future::Future, time::Duration};

pub use create_room::{CreateRoomUseCase, NewRoom};
pub use deliver_broadcast::DeliverBroadcastUseCase;
pub use disconnect::DisconnectUseCase;
pub use error::UseCaseError;
pub use get_room::GetRoomUseCase;
pub use join_channel::JoinChannelUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_member::KickMemberUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use playback_control::PlaybackControlUseCase;
pub use relay_event::{RelayEvent, RelayEventUseCase};
pub use sequencer::RoomSequencer;

/// 外部ストア呼び出しのデフォルトのタイムアウト
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// 外部ストアの呼び出しをタイムアウト付きで実行する
///
/// タイムアウトした場合は `UseCaseError::StoreUnavailable` を返す。
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, UseCaseError>
where
    F: Future<Output = Result<T, E>>,
    UseCaseError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(UseCaseError::from),
        Err(_) => {
            tracing::warn!(
                "{} timed out after {} ms",
                operation,
                limit.as_millis()
            );
            Err(UseCaseError::StoreUnavailable(format!(
                "{} timed out",
                operation
            )))
        }
    }
}
