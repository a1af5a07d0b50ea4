//! Column width heuristic.
//!
//! Widths are pixel estimates, not exact text measurement: a fixed average
//! glyph width plus cell padding. Initial width comes from the header text,
//! clamped to `[MIN_WIDTH, MAX_WIDTH]`; sampling job values only ever widens
//! a column, never narrows it, so re-running the pass with more rows is
//! monotonic and idempotent.

use serde_json::Value;

use dex_jobs::ExtractionJob;
use dex_model::FlatLeaf;

pub const MIN_WIDTH: u16 = 96;
pub const MAX_WIDTH: u16 = 420;
/// Object/list/table cells render as a count badge, not their content.
pub const CONTAINER_SUMMARY_WIDTH: u16 = 140;
/// How many jobs the widening pass samples.
pub const SAMPLE_ROWS: usize = 20;

const PER_CHAR: u16 = 8;
const CELL_PADDING: u16 = 24;

pub fn clamp_width(width: u16) -> u16 {
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Width derived from the header text alone.
pub fn header_width(name: &str) -> u16 {
    clamp_width(text_width(name.chars().count()))
}

/// Header width widened by sampling up to [`SAMPLE_ROWS`] jobs' values.
pub fn sampled_width(leaf: &FlatLeaf, jobs: &[ExtractionJob]) -> u16 {
    let mut width = header_width(&leaf.name);
    for job in jobs.iter().take(SAMPLE_ROWS) {
        if let Some(value) = job.results.get(&leaf.id) {
            width = width.max(value_width(leaf, value));
        }
    }
    width
}

fn value_width(leaf: &FlatLeaf, value: &Value) -> u16 {
    if leaf.container || leaf.field_type.is_container() {
        return CONTAINER_SUMMARY_WIDTH;
    }
    let chars = match value {
        Value::String(text) => text.chars().count(),
        Value::Null => 0,
        other => other.to_string().chars().count(),
    };
    clamp_width(text_width(chars))
}

fn text_width(chars: usize) -> u16 {
    let chars = u16::try_from(chars).unwrap_or(u16::MAX / PER_CHAR);
    chars.saturating_mul(PER_CHAR).saturating_add(CELL_PADDING)
}
