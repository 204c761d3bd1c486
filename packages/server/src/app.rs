//! Dependency wiring for the in-process deployment.

use std::sync::Arc;

use matinee_shared::time::Clock;

use crate::{
    config::{ConfigError, ServerConfig},
    infrastructure::{
        auth::HmacTokenVerifier, cache::InMemorySyncCache, content::StaticContentCatalog,
        message_pusher::WebSocketMessagePusher, pubsub::LocalRoomPubSub,
        repository::InMemoryRoomRepository,
    },
    ui::{AppState, Server},
    usecase::{
        CreateRoomUseCase, DeliverBroadcastUseCase, DisconnectUseCase, GetRoomUseCase,
        JoinChannelUseCase, JoinRoomUseCase, KickMemberUseCase, LeaveRoomUseCase,
        ListRoomsUseCase, PlaybackControlUseCase, RelayEventUseCase, RoomSequencer,
    },
};

/// Build a server backed by in-memory stores and a process-local pub/sub
///
/// # Errors
///
/// Returns `ConfigError` when `config` fails validation.
pub fn build_server(config: &ServerConfig, clock: Arc<dyn Clock>) -> Result<Server, ConfigError> {
    config.validate()?;
    let store_timeout = config.store_timeout();

    // Initialize dependencies in order:
    // 1. Room Store / Sync Cache
    // 2. MessagePusher / PubSub
    // 3. Token verifier / Content catalog
    // 4. UseCases
    // 5. AppState and Server

    // 1. Create stores (in-memory implementation)
    let repository = Arc::new(InMemoryRoomRepository::new());
    let cache = Arc::new(InMemorySyncCache::new(config.clock_ttl()));

    // 2. Create MessagePusher (WebSocket implementation) and the room pub/sub
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let pubsub = Arc::new(LocalRoomPubSub::new());

    // 3. Create external service adapters
    let token_verifier = Arc::new(HmacTokenVerifier::new(
        config.token_secret.clone(),
        clock.clone(),
    ));
    let content_ids = config.content_ids()?;
    let catalog = if content_ids.is_empty() {
        Arc::new(StaticContentCatalog::accept_any())
    } else {
        tracing::info!("Accepting {} known content id(s)", content_ids.len());
        Arc::new(StaticContentCatalog::new(content_ids))
    };

    // 4. Create UseCases
    // Leave and playback control share one lane per room
    let sequencer = Arc::new(RoomSequencer::new());
    let create_room_usecase = Arc::new(
        CreateRoomUseCase::new(
            repository.clone(),
            cache.clone(),
            catalog,
            clock.clone(),
        )
        .with_store_timeout(store_timeout),
    );
    let join_room_usecase =
        Arc::new(JoinRoomUseCase::new(repository.clone()).with_store_timeout(store_timeout));
    let get_room_usecase =
        Arc::new(GetRoomUseCase::new(repository.clone()).with_store_timeout(store_timeout));
    let list_rooms_usecase =
        Arc::new(ListRoomsUseCase::new(repository.clone()).with_store_timeout(store_timeout));
    let leave_room_usecase = Arc::new(
        LeaveRoomUseCase::new(repository.clone(), cache.clone(), pubsub.clone())
            .with_sequencer(sequencer.clone())
            .with_store_timeout(store_timeout),
    );
    let kick_member_usecase = Arc::new(
        KickMemberUseCase::new(repository.clone(), pubsub.clone())
            .with_store_timeout(store_timeout),
    );
    let join_channel_usecase = Arc::new(
        JoinChannelUseCase::new(
            repository.clone(),
            cache.clone(),
            message_pusher.clone(),
            pubsub.clone(),
            leave_room_usecase.clone(),
        )
        .with_store_timeout(store_timeout),
    );
    let disconnect_usecase = Arc::new(
        DisconnectUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            pubsub.clone(),
            leave_room_usecase.clone(),
        )
        .with_store_timeout(store_timeout),
    );
    let playback_control_usecase = Arc::new(
        PlaybackControlUseCase::new(repository.clone(), cache, pubsub.clone(), clock.clone())
            .with_sequencer(sequencer)
            .with_store_timeout(store_timeout),
    );
    let relay_event_usecase = Arc::new(
        RelayEventUseCase::new(message_pusher.clone(), pubsub.clone(), clock)
            .with_store_timeout(store_timeout),
    );
    let deliver_broadcast_usecase = Arc::new(
        DeliverBroadcastUseCase::new(message_pusher.clone(), repository)
            .with_store_timeout(store_timeout),
    );

    // 5. Create AppState and Server
    let state = AppState {
        token_verifier,
        message_pusher,
        create_room_usecase,
        join_room_usecase,
        get_room_usecase,
        list_rooms_usecase,
        leave_room_usecase,
        kick_member_usecase,
        join_channel_usecase,
        playback_control_usecase,
        relay_event_usecase,
        disconnect_usecase,
        deliver_broadcast_usecase,
    };
    Ok(Server::new(state, pubsub))
}
