//! Segment database collaborator.
//!
//! The HTTP transport is provided by the host; this module defines the
//! [`SegmentApi`] seam, the response wire format, error mapping and user
//! id generation, plus a directory-backed implementation.

mod error;
mod file_source;
mod user_id;
pub mod wire;

pub use error::{error_from_status, ApiError};
pub use file_source::{FileSegmentSource, Vote};
pub use user_id::{new_user_id, USER_ID_LEN};
pub use wire::{decode_segments, parse_skip_segments, to_skip_segments_json, RawSegment};

use crate::segments::Segment;

/// Default segment server.
pub const DEFAULT_SERVER: &str = "sponsor.ajay.app";

/// Access to the crowd-sourced segment database.
///
/// Calls are blocking and may be made from the scheduler's worker thread.
pub trait SegmentApi: Send + Sync {
    /// Segments of `video_id` in the given categories, sorted ascending by start.
    ///
    /// Fails with [`ApiError::NotFound`] when the video has no known segments.
    fn fetch_segments(
        &self,
        video_id: &str,
        categories: &[String],
    ) -> Result<Vec<Segment>, ApiError>;

    /// Vote a segment up or down.
    fn vote(&self, uuid: &str, upvote: bool) -> Result<(), ApiError>;

    /// Report that a segment was skipped.
    fn report_viewed(&self, uuid: &str) -> Result<(), ApiError>;
}
