//! Client-side playback reconciliation and reconnect policy.
//!
//! Pure functions over the server's sync clock, kept free of I/O so they can be
//! tested without a socket.

use matinee_server::infrastructure::dto::http::SyncClockDto;

use crate::error::ClientError;

/// A follower re-seeks only when it is further than this from the owner's clock
pub const DRIFT_THRESHOLD_SECS: f64 = 2.0;

/// Where the owner's playback is at `now_millis` according to `clock`.
///
/// While playing, the offset advances with wall time since `serverTime`.
/// Clock skew can put `now_millis` before `serverTime`; elapsed time is clamped to zero.
pub fn projected_target(clock: &SyncClockDto, now_millis: i64) -> f64 {
    if clock.playing {
        let elapsed = (now_millis - clock.server_time).max(0) as f64 / 1000.0;
        clock.offset + elapsed
    } else {
        clock.offset
    }
}

pub fn needs_resync(local_position: f64, target: f64) -> bool {
    (local_position - target).abs() > DRIFT_THRESHOLD_SECS
}

/// Simulated local player
///
/// Holds the position captured at `anchored_at` and extrapolates while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPlayer {
    position: f64,
    playing: bool,
    anchored_at: i64,
}

impl LocalPlayer {
    pub fn new(now_millis: i64) -> Self {
        Self {
            position: 0.0,
            playing: false,
            anchored_at: now_millis,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position_at(&self, now_millis: i64) -> f64 {
        if self.playing {
            self.position + (now_millis - self.anchored_at).max(0) as f64 / 1000.0
        } else {
            self.position
        }
    }

    /// Follow a clock received from the server.
    ///
    /// Returns the new position when the player had to re-seek; small drift is
    /// tolerated and only the playing state is updated.
    pub fn apply_clock(&mut self, clock: &SyncClockDto, now_millis: i64) -> Option<f64> {
        let current = self.position_at(now_millis);
        let target = projected_target(clock, now_millis);
        let resync = needs_resync(current, target);

        self.position = if resync { target } else { current };
        self.playing = clock.playing;
        self.anchored_at = now_millis;

        resync.then_some(target)
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::Unauthorized)
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }
    current_attempt < max_attempts
}
