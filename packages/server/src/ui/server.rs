//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{delete, get, post},
};
use futures_util::stream::{BoxStream, StreamExt};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::{PubSubMessage, RoomPubSub},
    usecase::DeliverBroadcastUseCase,
};

use super::{
    handler::{
        create_room, get_room, health_check, join_room, leave_room, list_rooms,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the HTTP and WebSocket router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/health", get(health_check))
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/join/{invite_code}", post(join_room))
        .route("/rooms/{room_id}/leave", delete(leave_room))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch-party server
///
/// Owns the application state and the pub/sub subscription that feeds
/// room broadcasts to the connections held by this process.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, pubsub);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// RoomPubSub（ルームイベントのファンアウト）
    pubsub: Arc<dyn RoomPubSub>,
}

impl Server {
    pub fn new(state: AppState, pubsub: Arc<dyn RoomPubSub>) -> Self {
        Self {
            state: Arc::new(state),
            pubsub,
        }
    }

    /// Bind to `host:port` and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Watch-party server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let relay = tokio::spawn(relay_loop(
            self.pubsub.subscribe(),
            self.state.deliver_broadcast_usecase.clone(),
        ));

        let app = build_router(self.state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        relay.abort();
        result
    }
}

/// Deliver every broadcast published on the pub/sub to local connections
///
/// After a lag the attachments are resynced against the room store, since the
/// skipped broadcasts may have carried evictions or room closures.
async fn relay_loop(
    mut messages: BoxStream<'static, PubSubMessage>,
    deliver: Arc<DeliverBroadcastUseCase>,
) {
    while let Some(message) = messages.next().await {
        let broadcast = match message {
            PubSubMessage::Broadcast(broadcast) => broadcast,
            PubSubMessage::Lagged(skipped) => {
                let detached = deliver.resync().await;
                tracing::warn!(
                    "Resynced attachments after skipping {} broadcast(s), detached {}",
                    skipped,
                    detached
                );
                continue;
            }
        };
        let room_id = broadcast.room_id.clone();
        let kind = broadcast.event.kind();
        match deliver.execute(broadcast).await {
            Ok(delivered) => {
                tracing::debug!(
                    "Delivered {} in room '{}' to {} connection(s)",
                    kind,
                    room_id,
                    delivered
                );
            }
            Err(e) => {
                tracing::warn!("Failed to deliver {} in room '{}': {}", kind, room_id, e);
            }
        }
    }
    tracing::info!("Room broadcast stream closed");
}
