//! segskip - automatic segment skipping for externally controlled players
//!
//! Seeks past crowd-sourced time ranges ("segments") of whatever a host
//! player is playing, while the user keeps pausing, seeking and changing
//! speed, and while the player reports stale positions after seeks.
//!
//! # Module Structure
//!
//! - [`player`] - host player traits, position estimation, a simulated player
//! - [`scheduler`] - `CheckpointScheduler`: wait until the clock crosses a checkpoint
//! - [`segments`] - segment model, validation, selection and chaining
//! - [`sponsorblock`] - segment database seam and wire format
//! - [`session`] - `PlaybackMonitor` and the skip policy
//! - [`config`] - configuration file

pub mod cli;
pub mod config;
pub mod player;
pub mod scheduler;
pub mod segments;
pub mod session;
pub mod sponsorblock;

pub use config::Config;
pub use session::PlaybackMonitor;
