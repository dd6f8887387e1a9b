//! Drops malformed lines from a raw price CSV before training.
//!
//! A line is dropped when it carries a missing-value marker (`null`, `NaN`),
//! or when the first `-` after the date prefix sits further than
//! [`NEGATIVE_GUARD_OFFSET`] characters into the remainder, which is how
//! corrupted negative prices show up in the raw exports.

use crate::domain::errors::PipelineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Width of the `YYYY-MM-DD` prefix of every data line.
pub const DATE_PREFIX_LEN: usize = 10;

/// Offset into the post-date segment beyond which a `-` is treated as a sign.
pub const NEGATIVE_GUARD_OFFSET: usize = 10;

const NOISE_MARKERS: &[&str] = &["null", "NaN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict {
    Keep,
    MissingValue,
    NegativeValue,
}

/// Outcome of a filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterReport {
    pub output: PathBuf,
    pub kept: usize,
    pub dropped_null: usize,
    pub dropped_negative: usize,
}

pub fn classify_line(line: &str) -> LineVerdict {
    if NOISE_MARKERS.iter().any(|marker| line.contains(marker)) {
        return LineVerdict::MissingValue;
    }

    let negative = line
        .chars()
        .skip(DATE_PREFIX_LEN)
        .position(|c| c == '-')
        .is_some_and(|offset| offset > NEGATIVE_GUARD_OFFSET);
    if negative {
        LineVerdict::NegativeValue
    } else {
        LineVerdict::Keep
    }
}

/// `prices.csv` -> `prices_CLEAN.csv`, next to the source.
pub fn clean_path(raw: &Path) -> PathBuf {
    let stem = raw
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match raw.extension() {
        Some(ext) => format!("{}_CLEAN.{}", stem, ext.to_string_lossy()),
        None => format!("{}_CLEAN", stem),
    };
    raw.with_file_name(name)
}

/// Filters `raw` into [`clean_path`]`(raw)`.
///
/// The source is read completely before the output is created, so an
/// unreadable source leaves no output file behind.
pub fn filter_noise_lines(raw: &Path) -> Result<FilterReport, PipelineError> {
    let content = fs::read_to_string(raw).map_err(|e| PipelineError::io(raw, e))?;
    let output = clean_path(raw);

    let mut report = FilterReport {
        output: output.clone(),
        kept: 0,
        dropped_null: 0,
        dropped_negative: 0,
    };
    let mut cleaned = String::with_capacity(content.len());

    for line in content.lines() {
        match classify_line(line) {
            LineVerdict::Keep => {
                cleaned.push_str(line);
                cleaned.push('\n');
                report.kept += 1;
            }
            LineVerdict::MissingValue => {
                debug!("Dropping line with missing value: {}", line);
                report.dropped_null += 1;
            }
            LineVerdict::NegativeValue => {
                debug!("Dropping line with negative value: {}", line);
                report.dropped_negative += 1;
            }
        }
    }

    fs::write(&output, cleaned).map_err(|e| PipelineError::io(&output, e))?;
    info!(
        "Filtered {:?}: kept {}, dropped {} missing, {} negative",
        raw, report.kept, report.dropped_null, report.dropped_negative
    );
    Ok(report)
}
