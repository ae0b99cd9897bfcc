//! Segment database backed by a directory of JSON files.
//!
//! Each video's segments live in `<dir>/<video_id>.json`, in the same
//! format the segment server responds with. Votes and view reports are
//! recorded in memory and logged.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use super::error::ApiError;
use super::wire::parse_skip_segments;
use super::SegmentApi;
use crate::segments::Segment;

/// A vote cast through [`FileSegmentSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub uuid: String,
    pub upvote: bool,
}

pub struct FileSegmentSource {
    dir: PathBuf,
    votes: Mutex<Vec<Vote>>,
    views: Mutex<Vec<String>>,
}

impl FileSegmentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            votes: Mutex::new(Vec::new()),
            views: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the segment file for `video_id`.
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", video_id))
    }

    pub fn votes(&self) -> Vec<Vote> {
        match self.votes.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn views(&self) -> Vec<String> {
        match self.views.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn is_plain_id(video_id: &str) -> bool {
    !video_id.is_empty()
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl SegmentApi for FileSegmentSource {
    fn fetch_segments(
        &self,
        video_id: &str,
        categories: &[String],
    ) -> Result<Vec<Segment>, ApiError> {
        if !is_plain_id(video_id) {
            return Err(ApiError::Transport(format!("invalid video id: {:?}", video_id)));
        }

        let path = self.path_for(video_id);
        if !path.exists() {
            return Err(ApiError::NotFound {
                video_id: video_id.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let mut segments = parse_skip_segments(&content)?;
        if !categories.is_empty() {
            segments.retain(|seg| categories.contains(&seg.category));
        }

        // The server answers 404 when nothing matches the requested categories
        if segments.is_empty() {
            return Err(ApiError::NotFound {
                video_id: video_id.to_string(),
            });
        }
        Ok(segments)
    }

    fn vote(&self, uuid: &str, upvote: bool) -> Result<(), ApiError> {
        info!(uuid, upvote, "vote on segment");
        let vote = Vote {
            uuid: uuid.to_string(),
            upvote,
        };
        match self.votes.lock() {
            Ok(mut guard) => guard.push(vote),
            Err(poisoned) => poisoned.into_inner().push(vote),
        }
        Ok(())
    }

    fn report_viewed(&self, uuid: &str) -> Result<(), ApiError> {
        info!(uuid, "segment viewed");
        match self.views.lock() {
            Ok(mut guard) => guard.push(uuid.to_string()),
            Err(poisoned) => poisoned.into_inner().push(uuid.to_string()),
        }
        Ok(())
    }
}
