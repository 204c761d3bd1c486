//! Client execution logic with reconnection support.

use std::time::Duration;

use matinee_shared::time::{Clock, SystemClock};

use crate::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::{SessionMemory, run_client_session},
    ui::spawn_readline,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the watch-party client with reconnection logic
///
/// After a reconnect the last joined room is joined again.
pub async fn run_client(
    url: String,
    token: String,
    room_id: Option<String>,
) -> Result<(), ClientError> {
    let clock = SystemClock;
    let mut input = spawn_readline();
    let mut memory = SessionMemory::new(room_id, clock.now_millis());
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &token, &mut input, &mut memory, &clock).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) => {
                if should_exit_immediately(&e) {
                    tracing::error!("{}. Check the token and try again.", e);
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}
