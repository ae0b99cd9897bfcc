//! Playback position estimation.
//!
//! Many players keep reporting the pre-seek position for a moment after a
//! discontinuous seek. The estimator masks this by extrapolating from the
//! seek target until the hint expires, after which the raw position is
//! trusted again.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::control::PlayerError;

/// Default lifetime of a seek hint.
pub const DEFAULT_SEEK_HINT_TTL: Duration = Duration::from_secs(3);

/// A recent seek target and when it was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekHint {
    pub target: f64,
    pub observed_at: Instant,
}

/// Best-effort corrected playback clock.
#[derive(Debug, Clone)]
pub struct PositionEstimator {
    speed: f64,
    paused: bool,
    hint: Option<SeekHint>,
    hint_ttl: Duration,
}

impl Default for PositionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SEEK_HINT_TTL)
    }
}

impl PositionEstimator {
    pub fn new(hint_ttl: Duration) -> Self {
        Self {
            speed: 1.0,
            paused: false,
            hint: None,
            hint_ttl,
        }
    }

    /// Playback speed as last reported (ignores pause).
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Speed at which the media clock actually advances: 0 while paused.
    pub fn effective_speed(&self) -> f64 {
        if self.paused {
            0.0
        } else {
            self.speed
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed < 0.0 {
            warn!(speed, "negative playback speed, treating as stopped clock");
        }
        self.speed = speed.max(0.0);
    }

    pub fn set_hint_ttl(&mut self, hint_ttl: Duration) {
        self.hint_ttl = hint_ttl;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn seek_hint(&self) -> Option<SeekHint> {
        self.hint
    }

    /// Record a seek target observed now, or clear the hint.
    pub fn set_seek_hint(&mut self, target: Option<f64>) {
        self.set_seek_hint_at(target, Instant::now());
    }

    pub fn set_seek_hint_at(&mut self, target: Option<f64>, observed_at: Instant) {
        self.hint = target.map(|target| SeekHint {
            target,
            observed_at,
        });
    }

    /// Position extrapolated from the seek hint, if one is still valid at `now`.
    ///
    /// An expired hint is discarded.
    pub fn hinted_time_at(&mut self, now: Instant) -> Option<f64> {
        let hint = self.hint?;
        let age = now.saturating_duration_since(hint.observed_at);
        if age > self.hint_ttl {
            debug!("seek hint expired");
            self.hint = None;
            return None;
        }

        Some(hint.target + age.as_secs_f64() * self.effective_speed())
    }

    /// Corrected current time at `now`.
    ///
    /// `raw` is only consulted when no valid hint exists. A failed raw read
    /// is logged and treated as `0.0`.
    pub fn current_time_at(
        &mut self,
        now: Instant,
        raw: impl FnOnce() -> Result<f64, PlayerError>,
    ) -> f64 {
        match self.hinted_time_at(now) {
            Some(time) => time,
            None => resolve_raw(raw()),
        }
    }

    pub fn current_time(&mut self, raw: impl FnOnce() -> Result<f64, PlayerError>) -> f64 {
        self.current_time_at(Instant::now(), raw)
    }

    /// Wall-clock duration until the media clock advances by `gap` seconds.
    ///
    /// `None` while the clock is not advancing.
    pub fn wait_for(&self, gap: f64) -> Option<f64> {
        let speed = self.effective_speed();
        if speed > 0.0 {
            Some(gap / speed)
        } else {
            None
        }
    }
}

/// Unwrap a raw position read, degrading failures to `0.0`.
pub fn resolve_raw(raw: Result<f64, PlayerError>) -> f64 {
    match raw {
        Ok(time) => time,
        Err(err) => {
            warn!(error = %err, "failed to get playback time, assuming 0.0");
            0.0
        }
    }
}
