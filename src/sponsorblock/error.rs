//! Segment database errors.

/// Errors that can occur when talking to the segment database.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The video has no known segments (HTTP 404)
    #[error("No segments found for video {video_id}")]
    NotFound { video_id: String },

    #[error("Segment server responded with status {status}")]
    Response { status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to decode segment response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to read segment data: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Map a non-success HTTP status to an error.
pub fn error_from_status(status: u16, video_id: &str) -> ApiError {
    match status {
        404 => ApiError::NotFound {
            video_id: video_id.to_string(),
        },
        status => ApiError::Response { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_404_is_not_found() {
        let err = error_from_status(404, "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No segments found for video abc");
    }

    #[test]
    fn other_status_is_response_error() {
        let err = error_from_status(502, "abc");
        assert!(!err.is_not_found());
        assert!(matches!(err, ApiError::Response { status: 502 }));
    }
}
