//! Normalization of fetched text blobs into JSON Lines.
//!
//! A blob is whatever one remote item yielded: a JSON array of records, a
//! single JSON record, or text that is already newline-delimited JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use analytics_core::error::{AnalyticsError, Result};
use serde_json::{Map, Value};

/// Shape of a fetched blob, decided once by [`BlobContent::classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlobContent {
    /// The blob was a JSON array; one output line per element.
    ParsedArray(Vec<Value>),
    /// The blob was a single JSON object; one output line.
    Parsed(Map<String, Value>),
    /// Anything else, passed through trimmed.
    RawText(String),
}

impl BlobContent {
    /// Classify `text`: array, then object, then raw-text fallback.
    ///
    /// JSON scalars (strings, numbers, booleans, null) are not records and
    /// fall back to raw text, exactly like unparseable input.
    pub fn classify(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => BlobContent::ParsedArray(items),
            Ok(Value::Object(obj)) => BlobContent::Parsed(obj),
            _ => BlobContent::RawText(text.trim().to_string()),
        }
    }

    /// Render the blob as output lines, without trailing newlines.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            BlobContent::ParsedArray(items) => items.iter().map(Value::to_string).collect(),
            BlobContent::Parsed(obj) => vec![Value::Object(obj).to_string()],
            BlobContent::RawText(text) if text.is_empty() => Vec::new(),
            BlobContent::RawText(text) => vec![text],
        }
    }
}

/// Buffered JSONL output that truncates any existing file on creation.
pub struct JsonlWriter {
    path: PathBuf,
    out: BufWriter<File>,
    blobs: u64,
    lines: u64,
}

impl JsonlWriter {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        let write_err = |source| AnalyticsError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = File::create(path).map_err(write_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            blobs: 0,
            lines: 0,
        })
    }

    /// Classify and append one blob. Returns the number of lines written.
    pub fn write_blob(&mut self, text: &str) -> Result<u64> {
        let lines = BlobContent::classify(text).into_lines();
        for line in &lines {
            writeln!(self.out, "{}", line).map_err(|source| AnalyticsError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        }
        self.blobs += 1;
        self.lines += lines.len() as u64;
        Ok(lines.len() as u64)
    }

    /// Flush and close. Returns `(blobs, lines)` written.
    pub fn finish(mut self) -> Result<(u64, u64)> {
        self.out.flush().map_err(|source| AnalyticsError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok((self.blobs, self.lines))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
