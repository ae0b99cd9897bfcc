//! Plan command handler

use anyhow::{Context, Result};
use std::path::Path;

use segskip::segments::{validate, SegmentSelector};
use segskip::Config;

use super::validate::read_segment_file;

/// Print the skips the selector would walk through from `from` onwards.
pub fn handle(file: &Path, from: f64) -> Result<()> {
    let config = Config::load()?;
    let mut segments = read_segment_file(file)?;
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    validate(&segments).with_context(|| format!("{} is invalid", file.display()))?;

    let mut selector = SegmentSelector::new(config.skip_margins());
    selector.load("plan", segments);

    let skips = selector.planned_skips(from);
    if skips.is_empty() {
        println!("No skips after {:.3}", from);
        return Ok(());
    }

    println!("{:>9}  {:>9}  {:>9}  SEGMENT", "AT", "UNTIL", "LAND");
    for skip in skips {
        let seg = &selector.segments()[skip.index];
        println!(
            "{:>9.3}  {:>9.3}  {:>9.3}  {} [{}]",
            skip.start, skip.effective_end, skip.seek_target, seg.uuid, seg.category
        );
    }
    Ok(())
}
