//! Segment selection and chaining policy.
//!
//! Picks the next segment to skip, merges overlapping or near-adjacent
//! segments into one continuous skip span, and decides whether a skip is
//! worth doing and where it should land.

use tracing::{debug, info};

use super::Segment;

/// Margins used by the selector, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipMargins {
    /// Segments starting within this distance of the current span's end are chained into it
    pub chain_margin: f64,
    /// Spans (and remaining spans) shorter than this are not worth skipping
    pub min_skip: f64,
    /// Subtracted from the chained end to get the seek target
    pub reduce_skips: f64,
    /// Seek targets this close to the end of the media finish the item instead
    pub video_end_margin: f64,
}

impl Default for SkipMargins {
    fn default() -> Self {
        Self {
            chain_margin: 1.0,
            min_skip: 1.0,
            reduce_skips: 0.0,
            video_end_margin: 1.0,
        }
    }
}

/// What to do when a segment's checkpoint is reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipPlan {
    /// Seek within the current item
    SeekTo(f64),
    /// The skip would run into the end of the item: play the next one
    NextItem,
    /// Same, but nothing is queued
    StopPlayback,
}

/// A checkpoint as the selector would walk them, used for previews.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSkip {
    pub index: usize,
    pub start: f64,
    pub effective_end: f64,
    pub seek_target: f64,
}

/// End of the span starting at `index` after chaining subsequent segments.
///
/// `index` must be in range.
fn chain_end(segments: &[Segment], index: usize, chain_margin: f64) -> f64 {
    let mut end = segments[index].end;
    for next in &segments[index + 1..] {
        if next.start > end + chain_margin {
            break;
        }
        end = end.max(next.end);
    }
    end
}

/// Holds the segments of the current video and the pending checkpoint.
#[derive(Debug, Clone, Default)]
pub struct SegmentSelector {
    video_id: Option<String>,
    segments: Vec<Segment>,
    next: Option<usize>,
    margins: SkipMargins,
}

impl SegmentSelector {
    pub fn new(margins: SkipMargins) -> Self {
        Self {
            margins,
            ..Self::default()
        }
    }

    pub fn margins(&self) -> SkipMargins {
        self.margins
    }

    pub fn set_margins(&mut self, margins: SkipMargins) {
        self.margins = margins;
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `video_id` differs from the loaded video.
    pub fn needs_load(&self, video_id: &str) -> bool {
        self.video_id.as_deref() != Some(video_id)
    }

    /// Replace the held segments, unless `video_id` is already loaded.
    ///
    /// Returns whether the list was replaced. `segments` must be sorted by
    /// start (see [`validate`](super::validate)).
    pub fn load(&mut self, video_id: &str, segments: Vec<Segment>) -> bool {
        if !self.needs_load(video_id) {
            info!(video_id, "segments for video already loaded");
            return false;
        }

        debug!(video_id, count = segments.len(), "loading segments");
        self.video_id = Some(video_id.to_string());
        self.segments = segments;
        self.next = None;
        true
    }

    /// Forget the loaded video and its segments.
    pub fn clear(&mut self) {
        self.video_id = None;
        self.segments.clear();
        self.next = None;
    }

    /// Chained end of the segment at `index`, `None` if out of range.
    pub fn effective_end_for(&self, index: usize) -> Option<f64> {
        (index < self.segments.len())
            .then(|| chain_end(&self.segments, index, self.margins.chain_margin))
    }

    /// Where a skip of the segment at `index` should land.
    ///
    /// The reduce-skips margin is applied once, after chaining, and never
    /// moves the target before the segment's own start.
    pub fn seek_target_for(&self, index: usize) -> Option<f64> {
        let start = self.segments.get(index)?.start;
        let end = self.effective_end_for(index)?;
        Some((end - self.margins.reduce_skips).max(start))
    }

    fn is_worth_skipping(&self, index: usize, current_time: f64) -> bool {
        let seg = &self.segments[index];
        let end = chain_end(&self.segments, index, self.margins.chain_margin);
        let min_skip = self.margins.min_skip;

        if end < current_time + min_skip {
            debug!(%seg, effective_end = end, "remaining span too short, skipping candidate");
            return false;
        }
        if end - seg.start < min_skip {
            debug!(%seg, effective_end = end, "chained span too short, skipping candidate");
            return false;
        }
        true
    }

    /// Furthest chained end of the spans that already started at `current_time`.
    fn started_chain_end(&self, current_time: f64) -> Option<f64> {
        self.segments
            .iter()
            .enumerate()
            .take_while(|(_, seg)| seg.start <= current_time)
            .map(|(index, _)| chain_end(&self.segments, index, self.margins.chain_margin))
            .reduce(f64::max)
    }

    /// Index of the first worthwhile segment starting strictly after `current_time`.
    ///
    /// Segments chained into a span that already started belong to that span
    /// and never get a checkpoint of their own.
    pub fn find_next(&self, current_time: f64) -> Option<usize> {
        let owned_until = self.started_chain_end(current_time);
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.start > current_time)
            .filter(|(_, seg)| owned_until.map_or(true, |end| seg.start > end))
            .map(|(index, _)| index)
            .find(|&index| self.is_worth_skipping(index, current_time))
    }

    /// Select the next checkpoint after `current_time` and return it.
    pub fn select_next(&mut self, current_time: f64) -> Option<f64> {
        self.next = self.find_next(current_time);
        debug!(current_time, next = ?self.next_segment(), "selected next segment");
        self.checkpoint()
    }

    pub fn reset(&mut self) {
        self.next = None;
    }

    /// Start of the pending segment.
    pub fn checkpoint(&self) -> Option<f64> {
        self.next_segment().map(|seg| seg.start)
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next
    }

    pub fn next_segment(&self) -> Option<&Segment> {
        self.next.and_then(|index| self.segments.get(index))
    }

    /// Decide how to skip the segment at `index`.
    ///
    /// `total_duration` of `None` (or non-positive) disables the
    /// end-of-media rule.
    pub fn plan_skip(
        &self,
        index: usize,
        total_duration: Option<f64>,
        has_next_item: bool,
    ) -> Option<SkipPlan> {
        let target = self.seek_target_for(index)?;

        let plan = match total_duration {
            Some(total) if total > 0.0 && target >= total - self.margins.video_end_margin => {
                if has_next_item {
                    SkipPlan::NextItem
                } else {
                    SkipPlan::StopPlayback
                }
            }
            _ => SkipPlan::SeekTo(target),
        };
        Some(plan)
    }

    /// Walk the checkpoints from `from` onwards, assuming every skip lands
    /// on its seek target.
    pub fn planned_skips(&self, from: f64) -> Vec<PlannedSkip> {
        let mut skips = Vec::new();
        let mut current = from;

        while let Some(index) = self.find_next(current) {
            let seg = &self.segments[index];
            let effective_end = chain_end(&self.segments, index, self.margins.chain_margin);
            let seek_target = (effective_end - self.margins.reduce_skips).max(seg.start);
            skips.push(PlannedSkip {
                index,
                start: seg.start,
                effective_end,
                seek_target,
            });
            current = seek_target;
        }

        skips
    }
}
