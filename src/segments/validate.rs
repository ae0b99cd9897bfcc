//! Sanity checks for a freshly fetched segment list.

use super::Segment;

/// Segments this short (or shorter) are rejected, in seconds.
pub const MIN_SEGMENT_DURATION: f64 = 0.1;

/// The invariant a segment list failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidSegmentList {
    #[error("segment {index} ({uuid}): invalid start/end time {start}..{end}")]
    TooShort {
        index: usize,
        uuid: String,
        start: f64,
        end: f64,
    },

    #[error("segment {index} ({uuid}): wrong order, starts at {start} but previous starts at {previous_start}")]
    OutOfOrder {
        index: usize,
        uuid: String,
        start: f64,
        previous_start: f64,
    },
}

/// Check that every segment is longer than [`MIN_SEGMENT_DURATION`] and
/// that start times are strictly increasing.
///
/// Reports the first violation found. NaN times fail both checks.
pub fn validate(segments: &[Segment]) -> Result<(), InvalidSegmentList> {
    let mut previous_start: Option<f64> = None;

    for (index, seg) in segments.iter().enumerate() {
        if !(seg.end - seg.start > MIN_SEGMENT_DURATION) {
            return Err(InvalidSegmentList::TooShort {
                index,
                uuid: seg.uuid.clone(),
                start: seg.start,
                end: seg.end,
            });
        }

        if let Some(previous) = previous_start {
            if !(seg.start > previous) {
                return Err(InvalidSegmentList::OutOfOrder {
                    index,
                    uuid: seg.uuid.clone(),
                    start: seg.start,
                    previous_start: previous,
                });
            }
        }

        previous_start = Some(seg.start);
    }

    Ok(())
}
