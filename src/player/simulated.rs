//! Wall-clock driven player used by the CLI and tests.
//!
//! Behaves like a host media player: a playlist of items, speed changes,
//! pause/resume and seeking. After a seek it keeps reporting the pre-seek
//! position for a configurable latency window, mimicking players that
//! update their reported time lazily. Events are delivered asynchronously
//! on a dedicated pump thread, like a host delivering callbacks.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use super::control::{PlayerControl, PlayerError, PlayerEvent, PositionSource};

/// How often the pump checks for the natural end of an item.
const PUMP_TICK: Duration = Duration::from_millis(50);

/// An item in the simulated playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct SimItem {
    pub video_id: String,
    /// Duration in seconds
    pub duration: f64,
}

impl SimItem {
    pub fn new(video_id: impl Into<String>, duration: f64) -> Self {
        Self {
            video_id: video_id.into(),
            duration,
        }
    }
}

/// Position reported instead of the real one until `until`.
#[derive(Debug, Clone, Copy)]
struct StaleReport {
    position: f64,
    until: Instant,
}

#[derive(Debug)]
struct SimState {
    queue: VecDeque<SimItem>,
    current: Option<SimItem>,
    /// Position at `anchor`
    base_position: f64,
    /// Wall clock time the base position was taken
    anchor: Instant,
    speed: f64,
    paused: bool,
    stale: Option<StaleReport>,
}

impl SimState {
    fn position_at(&self, now: Instant) -> f64 {
        let Some(item) = &self.current else {
            return 0.0;
        };
        let elapsed = if self.paused {
            0.0
        } else {
            now.saturating_duration_since(self.anchor).as_secs_f64() * self.speed
        };
        (self.base_position + elapsed).min(item.duration)
    }

    fn rebase(&mut self, now: Instant) {
        self.base_position = self.position_at(now);
        self.anchor = now;
    }

    fn load(&mut self, item: SimItem, now: Instant) {
        self.current = Some(item);
        self.base_position = 0.0;
        self.anchor = now;
        self.stale = None;
    }
}

enum PumpMessage {
    Event(PlayerEvent),
    Shutdown,
}

/// Simulated host player.
pub struct SimulatedPlayer {
    state: Mutex<SimState>,
    events: Mutex<Option<Sender<PumpMessage>>>,
    seek_latency: Duration,
}

impl SimulatedPlayer {
    /// Create a player with a queued playlist. Nothing plays until [`play`](Self::play).
    pub fn new(items: Vec<SimItem>) -> Self {
        Self {
            state: Mutex::new(SimState {
                queue: items.into(),
                current: None,
                base_position: 0.0,
                anchor: Instant::now(),
                speed: 1.0,
                paused: false,
                stale: None,
            }),
            events: Mutex::new(None),
            seek_latency: Duration::ZERO,
        }
    }

    /// Report the pre-seek position for `latency` after every seek.
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let guard = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = guard.as_ref() {
            // Ignore send errors (pump may have shut down)
            let _ = tx.send(PumpMessage::Event(event));
        }
    }

    /// Start delivering events to `sink` on a dedicated thread.
    ///
    /// The pump also ends items that play to completion. Replaces any
    /// previously attached pump's sender.
    pub fn attach<F>(self: &Arc<Self>, sink: F) -> Result<EventPump, PlayerError>
    where
        F: Fn(PlayerEvent) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PumpMessage>();
        {
            let mut guard = match self.events.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = Some(tx.clone());
        }

        let player = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("sim-player-events".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(PUMP_TICK) {
                    Ok(PumpMessage::Event(event)) => sink(event),
                    Ok(PumpMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => player.check_item_end(),
                }
            })
            .map_err(|e| PlayerError::CommandFailed {
                command: "attach",
                message: e.to_string(),
            })?;

        Ok(EventPump {
            tx,
            handle: Some(handle),
        })
    }

    /// Start the first queued item.
    pub fn play(&self) -> Result<(), PlayerError> {
        self.advance_to_next_item()
    }

    pub fn pause(&self) {
        {
            let mut state = self.state();
            if state.paused || state.current.is_none() {
                return;
            }
            state.rebase(Instant::now());
            state.paused = true;
        }
        self.emit(PlayerEvent::Paused);
    }

    pub fn resume(&self) {
        {
            let mut state = self.state();
            if !state.paused {
                return;
            }
            // Reset timing when resuming
            state.anchor = Instant::now();
            state.paused = false;
        }
        self.emit(PlayerEvent::Resumed);
    }

    pub fn set_speed(&self, speed: f64) {
        {
            let mut state = self.state();
            state.rebase(Instant::now());
            state.speed = speed.max(0.0);
        }
        self.emit(PlayerEvent::SpeedChanged(speed));
    }

    /// The true position, ignoring seek latency.
    pub fn position(&self) -> f64 {
        self.state().position_at(Instant::now())
    }

    pub fn current_video_id(&self) -> Option<String> {
        self.state().current.as_ref().map(|item| item.video_id.clone())
    }

    fn check_item_end(&self) {
        let finished = {
            let state = self.state();
            match &state.current {
                Some(item) => !state.paused && state.position_at(Instant::now()) >= item.duration,
                None => false,
            }
        };

        if finished {
            debug!("simulated item played to completion");
            if self.has_next_item() {
                let _ = self.advance_to_next_item();
            } else {
                self.state().current = None;
                self.emit(PlayerEvent::PlaybackEnded);
            }
        }
    }
}

impl PositionSource for SimulatedPlayer {
    fn raw_position(&self) -> Result<f64, PlayerError> {
        let now = Instant::now();
        let mut state = self.state();
        if state.current.is_none() {
            return Err(PlayerError::NotPlaying);
        }
        match state.stale {
            Some(stale) if now < stale.until => Ok(stale.position),
            Some(_) => {
                state.stale = None;
                Ok(state.position_at(now))
            }
            None => Ok(state.position_at(now)),
        }
    }

    fn playback_speed(&self) -> Result<f64, PlayerError> {
        Ok(self.state().speed)
    }
}

impl PlayerControl for SimulatedPlayer {
    fn total_duration(&self) -> Result<f64, PlayerError> {
        self.state()
            .current
            .as_ref()
            .map(|item| item.duration)
            .ok_or(PlayerError::NotPlaying)
    }

    fn seek_to(&self, time: f64) -> Result<(), PlayerError> {
        let target = {
            let now = Instant::now();
            let mut state = self.state();
            let duration = match &state.current {
                Some(item) => item.duration,
                None => return Err(PlayerError::NotPlaying),
            };
            let previous = state.position_at(now);
            let target = time.clamp(0.0, duration);
            state.base_position = target;
            state.anchor = now;
            if !self.seek_latency.is_zero() {
                state.stale = Some(StaleReport {
                    position: previous,
                    until: now + self.seek_latency,
                });
            }
            target
        };
        self.emit(PlayerEvent::Seek(target));
        Ok(())
    }

    fn advance_to_next_item(&self) -> Result<(), PlayerError> {
        let next = {
            let mut state = self.state();
            match state.queue.pop_front() {
                Some(item) => {
                    state.load(item.clone(), Instant::now());
                    Some(item)
                }
                None => None,
            }
        };

        match next {
            Some(item) => {
                self.emit(PlayerEvent::PlaybackStarted(Some(item.video_id)));
                Ok(())
            }
            None => self.stop_playback(),
        }
    }

    fn stop_playback(&self) -> Result<(), PlayerError> {
        self.state().current = None;
        self.emit(PlayerEvent::PlaybackStopped);
        Ok(())
    }

    fn has_next_item(&self) -> bool {
        !self.state().queue.is_empty()
    }

    fn is_playing(&self) -> bool {
        self.state().current.is_some()
    }
}

/// Handle to the event pump thread. Shuts the pump down when dropped.
pub struct EventPump {
    tx: Sender<PumpMessage>,
    handle: Option<JoinHandle<()>>,
}

impl EventPump {
    /// Stop delivering events and wait for the pump thread to exit.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        let _ = self.tx.send(PumpMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.close();
    }
}
