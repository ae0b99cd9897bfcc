//! Host player abstraction
//!
//! - `control`: collaborator traits (`PositionSource`, `PlayerControl`) and events
//! - `clock`: `PositionEstimator`, the seek-hint corrected playback clock
//! - `simulated`: `SimulatedPlayer`, a wall-clock driven host used by the CLI and tests

pub mod clock;
pub mod control;
pub mod simulated;

pub use clock::{PositionEstimator, SeekHint, DEFAULT_SEEK_HINT_TTL};
pub use control::{PlayerControl, PlayerError, PlayerEvent, PositionSource};
pub use simulated::{EventPump, SimItem, SimulatedPlayer};
