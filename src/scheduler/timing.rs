//! Wait and arrival decisions for the worker loop.

use std::time::Duration;

use crate::player::DEFAULT_SEEK_HINT_TTL;

/// Amount of tolerance in seconds for waking up early.
///
/// If the remaining wait is at most this, the checkpoint counts as reached
/// instead of going back to sleep.
pub const DEFAULT_UNDERSHOOT: f64 = 0.25;

/// Max seconds allowed past a checkpoint before it is ignored.
pub const DEFAULT_OVERSHOOT: f64 = 1.5;

/// Tolerances used by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerTiming {
    /// Seconds of wall-clock wait treated as "already reached"
    pub undershoot: f64,
    /// Seconds past a checkpoint after which it is discarded
    pub overshoot: f64,
    /// Lifetime of a seek hint
    pub seek_hint_ttl: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            undershoot: DEFAULT_UNDERSHOOT,
            overshoot: DEFAULT_OVERSHOOT,
            seek_hint_ttl: DEFAULT_SEEK_HINT_TTL,
        }
    }
}

/// What the worker should do next while a checkpoint is pending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    /// Close enough, treat as reached
    Reached,
    /// Sleep for this long unless woken
    Sleep(Duration),
    /// Clock is not advancing (or there's no checkpoint): sleep until woken
    Indefinite,
}

/// Decide how long to wait given the wall-clock time left until the checkpoint.
///
/// `wall_wait` is `None` when the clock is not advancing.
pub fn plan_wait(wall_wait: Option<f64>, undershoot: f64) -> Wait {
    match wall_wait {
        None => Wait::Indefinite,
        Some(wait) if wait <= undershoot => Wait::Reached,
        Some(wait) => Wait::Sleep(Duration::from_secs_f64(wait)),
    }
}

/// Outcome of re-validating a checkpoint at wake time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arrival {
    OnTime,
    /// Too far past the checkpoint, by this many seconds
    Overshot(f64),
}

pub fn classify_arrival(checkpoint: f64, current_time: f64, overshoot: f64) -> Arrival {
    let past = current_time - checkpoint;
    if past > overshoot {
        Arrival::Overshot(past)
    } else {
        Arrival::OnTime
    }
}
