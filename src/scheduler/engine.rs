//! The checkpoint scheduler and its worker loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::policy::CheckpointPolicy;
use super::timing::{classify_arrival, plan_wait, Arrival, SchedulerTiming, Wait};
use crate::player::clock::resolve_raw;
use crate::player::{PositionEstimator, PositionSource};

/// Errors from starting the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Failed to spawn checkpoint worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Cannot start the checkpoint scheduler from its own worker thread")]
    StartFromWorker,
}

/// Lifecycle of the scheduler's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No worker running
    Idle,
    /// Worker sleeping or acting on a checkpoint
    Running,
    /// Stop requested, worker finishing
    Stopping,
}

/// Why the worker woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Reached,
    Notified,
    Stop,
}

/// Everything guarded by the wakeup mutex.
struct WakeState {
    stop: bool,
    /// Set by event handlers, consumed by the worker when it observes it
    woken: bool,
    clock: PositionEstimator,
    timing: SchedulerTiming,
}

struct Shared<P> {
    state: Mutex<WakeState>,
    wakeup: Condvar,
    policy: Mutex<P>,
    source: Arc<dyn PositionSource>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<P: CheckpointPolicy> Shared<P> {
    fn state(&self) -> MutexGuard<'_, WakeState> {
        lock(&self.state)
    }

    fn policy(&self) -> MutexGuard<'_, P> {
        lock(&self.policy)
    }

    /// Corrected media time. The raw position is read outside the wakeup lock.
    fn current_time(&self) -> f64 {
        let hinted = self.state().clock.hinted_time_at(Instant::now());
        match hinted {
            Some(time) => {
                debug!(time, "estimating time based on recent seek");
                time
            }
            None => resolve_raw(self.source.raw_position()),
        }
    }

    fn trigger_wakeup(&self, state: &mut WakeState) {
        state.woken = true;
        self.wakeup.notify_all();
    }

    /// Sleep until the pending checkpoint is reached or something wakes us.
    fn idle(&self) -> Wake {
        let checkpoint = self.policy().checkpoint();
        match checkpoint {
            Some(checkpoint) => debug!(checkpoint, "waiting until checkpoint (or until woken)"),
            None => debug!("sleeping until wakeup triggered"),
        }

        loop {
            let current = match checkpoint {
                Some(_) => self.current_time(),
                None => 0.0,
            };

            let mut state = self.state();
            if state.stop {
                return Wake::Stop;
            }
            if state.woken {
                state.woken = false;
                return Wake::Notified;
            }

            let wait = match checkpoint {
                Some(checkpoint) => plan_wait(
                    state.clock.wait_for(checkpoint - current),
                    state.timing.undershoot,
                ),
                None => Wait::Indefinite,
            };

            match wait {
                Wait::Reached => return Wake::Reached,
                Wait::Sleep(duration) => {
                    debug!(secs = duration.as_secs_f64(), "sleeping (or until woken)");
                    let _ = self.wakeup.wait_timeout(state, duration);
                }
                Wait::Indefinite => {
                    while !state.woken && !state.stop {
                        state = match self.wakeup.wait(state) {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                    }
                }
            }
        }
    }

    fn reselect(&self) {
        let current = self.current_time();
        debug!(current, "searching for next checkpoint");
        self.policy().select_next(current);
    }

    fn checkpoint_reached(&self) {
        let current = self.current_time();
        let overshoot = self.state().timing.overshoot;

        let mut policy = self.policy();
        let Some(checkpoint) = policy.checkpoint() else {
            warn!("reached checkpoint but there's no checkpoint");
            policy.select_next(current);
            return;
        };

        if let Arrival::Overshot(by) = classify_arrival(checkpoint, current, overshoot) {
            warn!(checkpoint, overshoot = by, "overshot checkpoint, ignoring");
            policy.select_next(current);
            return;
        }

        if self.state().stop {
            debug!(checkpoint, "stop requested, not firing checkpoint");
            return;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| policy.on_reached())) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(checkpoint, "something went wrong at checkpoint: {:#}", err),
            Err(_) => error!(checkpoint, "checkpoint action panicked"),
        }

        policy.reset();
    }

    fn run(&self) {
        loop {
            match self.idle() {
                Wake::Stop => {
                    debug!("woke up: stopping");
                    break;
                }
                Wake::Reached => {
                    debug!("woke up: reached checkpoint");
                    self.checkpoint_reached();
                }
                Wake::Notified => {
                    debug!("woke up: state changed");
                    self.reselect();
                }
            }
        }
    }
}

struct Worker {
    /// Taken by whoever joins; the id stays until the join is done
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

/// Waits for an externally controlled playback clock to cross checkpoints.
///
/// One background worker per instance. The worker asks the policy for the
/// pending checkpoint, sleeps until the estimated media time reaches it and
/// then fires [`CheckpointPolicy::on_reached`]. Seeks, pauses and speed
/// changes wake the worker, which then reselects instead of firing.
pub struct CheckpointScheduler<P: CheckpointPolicy> {
    shared: Arc<Shared<P>>,
    worker: Mutex<Option<Worker>>,
    /// Serializes start and stop so only one caller joins at a time
    lifecycle: Mutex<()>,
}

impl<P: CheckpointPolicy> CheckpointScheduler<P> {
    pub fn new(policy: P, source: Arc<dyn PositionSource>, timing: SchedulerTiming) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(WakeState {
                    stop: false,
                    woken: false,
                    clock: PositionEstimator::new(timing.seek_hint_ttl),
                    timing,
                }),
                wakeup: Condvar::new(),
                policy: Mutex::new(policy),
                source,
            }),
            worker: Mutex::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if !self.is_running() {
            SchedulerState::Idle
        } else if self.shared.state().stop {
            SchedulerState::Stopping
        } else {
            SchedulerState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(|worker| {
            worker
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
        })
    }

    fn on_worker_thread(&self) -> bool {
        let current = thread::current().id();
        lock(&self.worker)
            .as_ref()
            .is_some_and(|worker| worker.thread_id == current)
    }

    /// Spawn the worker.
    ///
    /// A worker that is still running is stopped first; one that is already
    /// stopping is waited for.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.on_worker_thread() {
            return Err(SchedulerError::StartFromWorker);
        }

        let _lifecycle = lock(&self.lifecycle);
        match self.state() {
            SchedulerState::Stopping => debug!("waiting for previous checkpoint worker to stop"),
            SchedulerState::Running => warn!("checkpoint scheduler already running, stopping"),
            SchedulerState::Idle => {}
        }
        self.shutdown_worker();

        let speed = match self.shared.source.playback_speed() {
            Ok(speed) => speed,
            Err(err) => {
                warn!(error = %err, "failed to read playback speed, assuming 1.0");
                1.0
            }
        };

        {
            let mut state = self.shared.state();
            state.stop = false;
            state.woken = false;
            state.clock.set_seek_hint(None);
            state.clock.set_paused(false);
            state.clock.set_speed(speed);
        }

        info!("starting checkpoint scheduler");
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("checkpoint-scheduler".to_string())
            .spawn(move || shared.run())?;

        let thread_id = handle.thread().id();
        *lock(&self.worker) = Some(Worker {
            handle: Some(handle),
            thread_id,
        });
        Ok(())
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Idempotent, and safe to call from several threads at once: every
    /// caller returns only after the worker has exited. When called from the
    /// worker thread itself (e.g. from inside `on_reached`) it only signals;
    /// the worker exits after the current action returns.
    pub fn stop(&self) {
        if self.on_worker_thread() {
            debug!("stop requested from worker thread, not joining");
            self.signal_stop();
            return;
        }

        let _lifecycle = lock(&self.lifecycle);
        self.shutdown_worker();
    }

    fn signal_stop(&self) {
        let mut state = self.shared.state();
        state.stop = true;
        self.shared.trigger_wakeup(&mut state);
    }

    /// Signal and join the worker. Callers hold the lifecycle lock.
    fn shutdown_worker(&self) {
        let handle = lock(&self.worker)
            .as_mut()
            .and_then(|worker| worker.handle.take());
        let Some(handle) = handle else {
            *lock(&self.worker) = None;
            return;
        };

        debug!("stopping checkpoint scheduler");
        self.signal_stop();

        debug!("waiting for checkpoint worker to join");
        if handle.join().is_err() {
            error!("checkpoint worker panicked");
        }
        *lock(&self.worker) = None;
        debug!("checkpoint scheduler stopped");
    }

    /// Wake a sleeping worker so it reselects its checkpoint. No-op when idle.
    pub fn notify_external_event(&self) {
        if !self.is_running() {
            return;
        }

        debug!("triggering wakeup");
        let mut state = self.shared.state();
        self.shared.trigger_wakeup(&mut state);
    }

    /// Wake the worker if running; `update` always runs.
    fn update_clock(&self, update: impl FnOnce(&mut PositionEstimator)) {
        let running = self.is_running();
        let mut state = self.shared.state();
        update(&mut state.clock);
        if running {
            self.shared.trigger_wakeup(&mut state);
        }
    }

    /// The player seeked to `target` seconds.
    pub fn on_seek(&self, target: f64) {
        self.update_clock(|clock| clock.set_seek_hint(Some(target)));
    }

    pub fn on_paused(&self) {
        self.update_clock(|clock| {
            clock.set_seek_hint(None);
            clock.set_paused(true);
        });
    }

    pub fn on_resumed(&self) {
        self.update_clock(|clock| clock.set_paused(false));
    }

    pub fn on_speed_changed(&self, speed: f64) {
        self.update_clock(|clock| {
            clock.set_seek_hint(None);
            clock.set_speed(speed);
        });
    }

    /// Replace the tolerances; takes effect on the next wake cycle.
    pub fn apply_timing(&self, timing: SchedulerTiming) {
        let mut state = self.shared.state();
        state.clock.set_hint_ttl(timing.seek_hint_ttl);
        state.timing = timing;
    }

    pub fn timing(&self) -> SchedulerTiming {
        self.shared.state().timing
    }

    /// Corrected media time, as the worker sees it.
    pub fn current_time(&self) -> f64 {
        self.shared.current_time()
    }

    /// Run `f` with exclusive access to the policy.
    ///
    /// Must not be called from inside `on_reached` (the policy is locked there).
    pub fn with_policy<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.shared.policy())
    }
}

impl<P: CheckpointPolicy> Drop for CheckpointScheduler<P> {
    fn drop(&mut self) {
        self.stop();
    }
}
