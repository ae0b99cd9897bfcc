//! Skip segments and the policy for choosing which one to act on next.
//!
//! - [`validate`] - sanity checks on a fetched list
//! - [`selector`] - `SegmentSelector`: next checkpoint, chaining, skip planning

pub mod selector;
pub mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use selector::{PlannedSkip, SegmentSelector, SkipMargins, SkipPlan};
pub use validate::{validate, InvalidSegmentList, MIN_SEGMENT_DURATION};

/// A time range of a video that should be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Opaque identifier assigned by the segment database
    pub uuid: String,
    /// Category such as "sponsor" or "intro"
    pub category: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Segment {
    pub fn new(uuid: impl Into<String>, category: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            uuid: uuid.into(),
            category: category.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {:.3}-{:.3}",
            self.uuid, self.category, self.start, self.end
        )
    }
}
