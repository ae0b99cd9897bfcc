//! Checkpoint scheduling engine.
//!
//! A checkpoint is a media time at which an action should be performed.
//! The scheduler takes care of waiting for an externally controlled player
//! to reach it, while the player may seek, pause or change speed at any
//! moment and reports stale positions right after seeking.
//!
//! # Module Structure
//!
//! - [`policy`] - `CheckpointPolicy`, the hooks a caller injects
//! - [`timing`] - tolerances and the pure wait/arrival decisions
//! - [`engine`] - `CheckpointScheduler`, the worker thread and its wakeup protocol
//!
//! The scheduler knows nothing about segments; see
//! [`SegmentSkipPolicy`](crate::session::SegmentSkipPolicy) for the policy
//! used by the playback monitor.

pub mod engine;
pub mod policy;
pub mod timing;

pub use engine::{CheckpointScheduler, SchedulerError, SchedulerState};
pub use policy::CheckpointPolicy;
pub use timing::{
    classify_arrival, plan_wait, Arrival, SchedulerTiming, Wait, DEFAULT_OVERSHOOT,
    DEFAULT_UNDERSHOOT,
};
