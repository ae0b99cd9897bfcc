//! Host player collaborator traits and event types.

/// Errors reported by a host player.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayerError {
    #[error("Player is not playing anything")]
    NotPlaying,

    #[error("Player query '{query}' failed: {message}")]
    QueryFailed { query: &'static str, message: String },

    #[error("Player command '{command}' failed: {message}")]
    CommandFailed {
        command: &'static str,
        message: String,
    },
}

/// Read-only access to the externally controlled playback clock.
///
/// The reported position may be stale for a short window after a
/// discontinuous seek; callers correct for that with
/// [`PositionEstimator`](super::PositionEstimator).
pub trait PositionSource: Send + Sync {
    /// Position of the current item in seconds, as reported by the host.
    fn raw_position(&self) -> Result<f64, PlayerError>;

    /// Current playback speed multiplier (1.0 = normal).
    fn playback_speed(&self) -> Result<f64, PlayerError>;
}

/// Full control over the host player.
///
/// Implementations wrap a concrete media player. All methods may be
/// called from the scheduler's worker thread.
pub trait PlayerControl: PositionSource {
    /// Total duration of the current item in seconds.
    fn total_duration(&self) -> Result<f64, PlayerError>;

    /// Seek the current item to `time` seconds.
    fn seek_to(&self, time: f64) -> Result<(), PlayerError>;

    /// Advance to the next queued item.
    fn advance_to_next_item(&self) -> Result<(), PlayerError>;

    /// Stop playback entirely.
    fn stop_playback(&self) -> Result<(), PlayerError>;

    /// Whether another item is queued after the current one.
    fn has_next_item(&self) -> bool;

    /// Whether the player currently has an item loaded and playing.
    fn is_playing(&self) -> bool;
}

/// Events delivered by the host player.
///
/// Hosts deliver these on whatever thread they like; see
/// [`PlaybackMonitor::handle_event`](crate::PlaybackMonitor::handle_event).
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Discontinuous seek to `target` seconds
    Seek(f64),
    Paused,
    Resumed,
    /// Playback speed changed to the given multiplier
    SpeedChanged(f64),
    /// A new item started playing; carries the video id if the host knows it
    PlaybackStarted(Option<String>),
    PlaybackEnded,
    PlaybackStopped,
    PlaybackError,
}

impl PlayerEvent {
    /// Whether this event ends the current playback session.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::PlaybackEnded | Self::PlaybackStopped | Self::PlaybackError
        )
    }
}
