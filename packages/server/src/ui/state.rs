//! Application state shared by every handler.

use std::sync::Arc;

use crate::{
    domain::{MessagePusher, TokenVerifier},
    usecase::{
        CreateRoomUseCase, DeliverBroadcastUseCase, DisconnectUseCase, GetRoomUseCase,
        JoinChannelUseCase, JoinRoomUseCase, KickMemberUseCase, LeaveRoomUseCase,
        ListRoomsUseCase, PlaybackControlUseCase, RelayEventUseCase,
    },
};

pub struct AppState {
    /// 資格情報の検証器（HTTP と WebSocket で共通）
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// 接続レジストリ（WebSocket 接続の登録・解除）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub get_room_usecase: Arc<GetRoomUseCase>,
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub kick_member_usecase: Arc<KickMemberUseCase>,
    pub join_channel_usecase: Arc<JoinChannelUseCase>,
    pub playback_control_usecase: Arc<PlaybackControlUseCase>,
    pub relay_event_usecase: Arc<RelayEventUseCase>,
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    /// Pub/Sub から受け取った配信を手元の接続に届ける
    pub deliver_broadcast_usecase: Arc<DeliverBroadcastUseCase>,
}
