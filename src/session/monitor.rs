//! Playback monitor: ties player events, segment loading and the scheduler together.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use tracing::{debug, error, info, warn};

use super::policy::{SegmentSkipPolicy, SkipSettings};
use super::prompt::SkipNotifier;
use crate::config::Config;
use crate::player::clock::resolve_raw;
use crate::player::{PlayerControl, PlayerError, PlayerEvent, PositionSource};
use crate::scheduler::{CheckpointScheduler, SchedulerError};
use crate::segments::{validate, InvalidSegmentList, Segment, SegmentSelector};
use crate::sponsorblock::{ApiError, SegmentApi};

/// Why no segments could be loaded for a video.
#[derive(Debug, thiserror::Error)]
pub enum SegmentLoadError {
    #[error("No segments found for video {0}")]
    NotFound(String),

    #[error("Failed to fetch segments: {0}")]
    Fetch(#[source] ApiError),

    #[error("Invalid segment list: {0}")]
    Invalid(#[from] InvalidSegmentList),

    #[error("Segment list for video {0} is empty")]
    Empty(String),
}

impl SegmentLoadError {
    fn log(&self, video_id: &str) {
        match self {
            Self::NotFound(_) => info!(video_id, "no segments for video"),
            Self::Fetch(err) => error!(video_id, error = %err, "failed to fetch segments"),
            Self::Invalid(err) => warn!(video_id, error = %err, "discarding invalid segment list"),
            Self::Empty(_) => warn!(video_id, "segment list is empty"),
        }
    }
}

/// Fetch and validate the segments of `video_id`.
pub fn load_segments(
    api: &dyn SegmentApi,
    video_id: &str,
    categories: &[String],
) -> Result<Vec<Segment>, SegmentLoadError> {
    let segments = api
        .fetch_segments(video_id, categories)
        .map_err(|err| match err {
            ApiError::NotFound { video_id } => SegmentLoadError::NotFound(video_id),
            other => SegmentLoadError::Fetch(other),
        })?;

    if segments.is_empty() {
        return Err(SegmentLoadError::Empty(video_id.to_string()));
    }
    validate(&segments)?;
    Ok(segments)
}

/// Exposes a player's clock to the scheduler.
struct PlayerClock(Arc<dyn PlayerControl>);

impl PositionSource for PlayerClock {
    fn raw_position(&self) -> Result<f64, PlayerError> {
        self.0.raw_position()
    }

    fn playback_speed(&self) -> Result<f64, PlayerError> {
        self.0.playback_speed()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Watches one player and skips segments in whatever it plays.
///
/// Feed it the player's events through [`handle_event`](Self::handle_event).
pub struct PlaybackMonitor {
    scheduler: CheckpointScheduler<SegmentSkipPolicy>,
    player: Arc<dyn PlayerControl>,
    api: Arc<dyn SegmentApi>,
    categories: Mutex<Vec<String>>,
    ignore_next: Mutex<Option<String>>,
    /// Held while fetching, so concurrent preloads collapse into one
    load_lock: Mutex<()>,
}

impl PlaybackMonitor {
    pub fn new(
        player: Arc<dyn PlayerControl>,
        api: Arc<dyn SegmentApi>,
        notifier: Arc<dyn SkipNotifier>,
        config: &Config,
    ) -> Self {
        let policy = SegmentSkipPolicy::new(
            SegmentSelector::new(config.skip_margins()),
            SkipSettings::from(config),
            Arc::clone(&player),
            Arc::clone(&api),
            notifier,
        );
        let source = Arc::new(PlayerClock(Arc::clone(&player)));
        Self {
            scheduler: CheckpointScheduler::new(policy, source, config.scheduler_timing()),
            player,
            api,
            categories: Mutex::new(config.api.categories.clone()),
            ignore_next: Mutex::new(None),
            load_lock: Mutex::new(()),
        }
    }

    pub fn scheduler(&self) -> &CheckpointScheduler<SegmentSkipPolicy> {
        &self.scheduler
    }

    /// Video whose segments are currently held.
    pub fn loaded_video(&self) -> Option<String> {
        self.scheduler
            .with_policy(|policy| policy.selector().video_id().map(str::to_string))
    }

    /// Dispatch a player event.
    ///
    /// Hosts must deliver events from their own thread, never synchronously
    /// from inside a [`PlayerControl`] call.
    pub fn handle_event(&self, event: PlayerEvent) {
        debug!(?event, "player event");
        match event {
            PlayerEvent::Seek(target) => self.scheduler.on_seek(target),
            PlayerEvent::Paused => self.scheduler.on_paused(),
            PlayerEvent::Resumed => self.scheduler.on_resumed(),
            PlayerEvent::SpeedChanged(speed) => self.scheduler.on_speed_changed(speed),
            PlayerEvent::PlaybackStarted(video_id) => {
                if let Err(err) = self.on_playback_started(video_id.as_deref()) {
                    error!(error = %err, "failed to start segment skipping");
                }
            }
            event if event.ends_session() => {
                if event == PlayerEvent::PlaybackError {
                    warn!("playback error, stopping");
                }
                self.end_session();
            }
            _ => {}
        }
    }

    /// A new item started playing: load its segments and start watching.
    pub fn on_playback_started(&self, video_id: Option<&str>) -> Result<(), SchedulerError> {
        self.scheduler.stop();

        let Some(video_id) = video_id else {
            info!("playing item has no video id, not skipping");
            self.clear_segments();
            return Ok(());
        };

        // One shot: any playback start consumes it
        let ignored = lock(&self.ignore_next).take();
        if ignored.as_deref() == Some(video_id) {
            info!(video_id, "ignoring video");
            self.clear_segments();
            return Ok(());
        }

        {
            let _guard = lock(&self.load_lock);
            if let Err(err) = self.prepare(video_id) {
                err.log(video_id);
                self.clear_segments();
                return Ok(());
            }
        }

        let current = resolve_raw(self.player.raw_position());
        let checkpoint = self
            .scheduler
            .with_policy(|policy| policy.selector_mut().select_next(current));
        debug!(video_id, current, ?checkpoint, "first checkpoint");

        info!(video_id, "watching playback for segments");
        self.scheduler.start()
    }

    /// Fetch segments ahead of playback.
    ///
    /// Returns false without doing anything while a session is being watched
    /// or another load is in progress.
    pub fn preload_segments(&self, video_id: &str) -> bool {
        if self.scheduler.is_running() {
            debug!(video_id, "session active, not preloading");
            return false;
        }

        let _guard = match self.load_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!(video_id, "segments already loading");
                return false;
            }
        };

        match self.prepare(video_id) {
            Ok(()) => true,
            Err(err) => {
                err.log(video_id);
                false
            }
        }
    }

    /// Don't skip anything the next time `video_id` starts playing.
    pub fn ignore_next_video(&self, video_id: &str) {
        *lock(&self.ignore_next) = Some(video_id.to_string());
    }

    /// Replace the configuration of the running monitor.
    pub fn apply_config(&self, config: &Config) {
        self.scheduler.with_policy(|policy| {
            policy.selector_mut().set_margins(config.skip_margins());
            policy.set_settings(SkipSettings::from(config));
        });
        self.scheduler.apply_timing(config.scheduler_timing());
        *lock(&self.categories) = config.api.categories.clone();
        self.scheduler.notify_external_event();
    }

    /// Stop watching. Loaded segments are kept.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    fn end_session(&self) {
        debug!("playback ended");
        self.scheduler.stop();
        self.clear_segments();
    }

    fn clear_segments(&self) {
        self.scheduler
            .with_policy(|policy| policy.selector_mut().clear());
    }

    /// Load segments unless they are already held. Caller holds the load lock.
    fn prepare(&self, video_id: &str) -> Result<(), SegmentLoadError> {
        let needs_load = self
            .scheduler
            .with_policy(|policy| policy.selector().needs_load(video_id));
        if !needs_load {
            debug!(video_id, "segments already loaded");
            return Ok(());
        }

        let categories = lock(&self.categories).clone();
        let segments = load_segments(self.api.as_ref(), video_id, &categories)?;
        info!(video_id, count = segments.len(), "loaded segments");
        self.scheduler
            .with_policy(|policy| policy.selector_mut().load(video_id, segments));
        Ok(())
    }
}
