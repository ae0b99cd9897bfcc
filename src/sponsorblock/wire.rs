//! Wire format of the segment database.
//!
//! A skip-segments response is a JSON array:
//!
//! ```json
//! [{"UUID": "96b8...", "category": "sponsor", "segment": [1.988, 9.61]}]
//! ```

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::segments::Segment;

/// One entry of a skip-segments response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub category: String,
    /// `[start, end]` in seconds
    pub segment: [f64; 2],
}

impl From<RawSegment> for Segment {
    fn from(raw: RawSegment) -> Self {
        let [start, end] = raw.segment;
        Segment::new(raw.uuid, raw.category, start, end)
    }
}

impl From<&Segment> for RawSegment {
    fn from(seg: &Segment) -> Self {
        Self {
            uuid: seg.uuid.clone(),
            category: seg.category.clone(),
            segment: [seg.start, seg.end],
        }
    }
}

/// Decode segments in the order they appear.
pub fn decode_segments(json: &str) -> Result<Vec<Segment>, ApiError> {
    let raw: Vec<RawSegment> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(Segment::from).collect())
}

/// Decode a skip-segments response, sorted ascending by start.
pub fn parse_skip_segments(json: &str) -> Result<Vec<Segment>, ApiError> {
    let mut segments = decode_segments(json)?;
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

/// Encode segments in the response format.
pub fn to_skip_segments_json(segments: &[Segment]) -> Result<String, ApiError> {
    let raw: Vec<RawSegment> = segments.iter().map(RawSegment::from).collect();
    Ok(serde_json::to_string_pretty(&raw)?)
}

/// Categories query parameter: a JSON array of category names.
pub fn categories_param(categories: &[String]) -> String {
    serde_json::to_string(categories).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_by_start() {
        let json = r#"[
            {"UUID": "b", "category": "intro", "segment": [11.44, 15.462]},
            {"UUID": "a", "category": "sponsor", "segment": [1.988, 9.61]}
        ]"#;
        let segments = parse_skip_segments(json).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::new("a", "sponsor", 1.988, 9.61));
        assert_eq!(segments[1].uuid, "b");
    }

    #[test]
    fn decode_keeps_file_order() {
        let json = r#"[
            {"UUID": "b", "category": "intro", "segment": [11.44, 15.462]},
            {"UUID": "a", "category": "sponsor", "segment": [1.988, 9.61]}
        ]"#;
        let segments = decode_segments(json).unwrap();
        assert_eq!(segments[0].uuid, "b");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"[{"UUID": "a", "category": "sponsor", "segment": [1, 2], "votes": 3}]"#;
        let segments = parse_skip_segments(json).unwrap();
        assert_eq!(segments[0].end, 2.0);
    }

    #[test]
    fn malformed_segment_is_decode_error() {
        let json = r#"[{"UUID": "a", "category": "sponsor", "segment": [1]}]"#;
        assert!(matches!(parse_skip_segments(json), Err(ApiError::Decode(_))));
    }

    #[test]
    fn encode_uses_response_field_names() {
        let json = to_skip_segments_json(&[Segment::new("a", "sponsor", 1.0, 2.0)]).unwrap();
        assert!(json.contains("\"UUID\": \"a\""));
        assert_eq!(parse_skip_segments(&json).unwrap()[0].start, 1.0);
    }

    #[test]
    fn categories_are_json_encoded() {
        let categories = vec!["sponsor".to_string(), "intro".to_string()];
        assert_eq!(categories_param(&categories), r#"["sponsor","intro"]"#);
    }
}
