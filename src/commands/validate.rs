//! Validate command handler

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use segskip::segments::{validate, Segment};
use segskip::sponsorblock::decode_segments;

/// Read a segment file, keeping the order segments appear in.
pub fn read_segment_file(file: &Path) -> Result<Vec<Segment>> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    decode_segments(&content).with_context(|| format!("Failed to parse {}", file.display()))
}

/// Check a segment file and list its segments.
///
/// Returns an error (exit status 1) when the list is invalid.
pub fn handle(file: &Path) -> Result<()> {
    let segments = read_segment_file(file)?;
    if segments.is_empty() {
        println!("{}: no segments", file.display());
        return Ok(());
    }

    validate(&segments).with_context(|| format!("{} is invalid", file.display()))?;

    println!("{}: {} valid segment(s)", file.display(), segments.len());
    for seg in &segments {
        println!("  {}", seg);
    }
    Ok(())
}
