//! Monitored playback sessions.
//!
//! # Module Structure
//!
//! - [`monitor`] - `PlaybackMonitor`: player events in, segment loading, scheduler lifecycle
//! - [`policy`] - `SegmentSkipPolicy`: the checkpoint policy that performs skips
//! - [`prompt`] - post-skip prompt, notifications and voting

pub mod monitor;
pub mod policy;
pub mod prompt;

pub use monitor::{load_segments, PlaybackMonitor, SegmentLoadError};
pub use policy::{SegmentSkipPolicy, SkipSettings};
pub use prompt::{
    vote_on_segment, Notification, PromptOutcome, PromptSettings, SkipNotifier, SkipPrompt,
};
