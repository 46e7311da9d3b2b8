//! Tolerant JSON Lines reading.
//!
//! Every non-blank line is parsed independently. Lines that are not valid
//! JSON, or valid JSON that is not an object, are counted and skipped; they
//! never abort the pass.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use analytics_core::error::{AnalyticsError, Result};
use analytics_core::models::RawRecord;
use tracing::debug;

/// Line-level counters for one reading pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Lines pulled from the input, including blank and malformed ones.
    pub lines: u64,
    pub blank_lines: u64,
    /// Lines that could not be read or did not decode to a JSON object.
    pub malformed_lines: u64,
    /// Lines decoded into a [`RawRecord`].
    pub records: u64,
}

/// Open `path` for buffered line reading.
pub fn open_jsonl(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| AnalyticsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Stream every record in `reader` to `on_record`, in input order.
pub fn read_records<R: BufRead>(reader: R, mut on_record: impl FnMut(RawRecord)) -> ReadStats {
    let mut stats = ReadStats::default();

    for (idx, line_result) in reader.lines().enumerate() {
        stats.lines += 1;
        let line_no = idx + 1;

        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                debug!("Skipping unreadable line {}: {}", line_no, e);
                stats.malformed_lines += 1;
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            stats.blank_lines += 1;
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping malformed JSON on line {}: {}", line_no, e);
                stats.malformed_lines += 1;
                continue;
            }
        };

        match RawRecord::from_value(&value) {
            Some(record) => {
                stats.records += 1;
                on_record(record);
            }
            None => {
                debug!("Skipping non-object JSON on line {}", line_no);
                stats.malformed_lines += 1;
            }
        }
    }

    stats
}

// ── Tests ─────────────────────────────────────────────────────────────────────
