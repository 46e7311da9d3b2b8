//! Markdown report rendering.
//!
//! The layout is consumed by downstream tooling and must stay byte-stable:
//!
//! ```text
//! # Analytics Report (<today>)
//!
//! ## Visits per day
//!
//! - <day>: <N> visits, <M> unique IPs
//!
//! ## Session duration
//!
//! - Average session duration: <X.X> seconds (based on <N> sessions)
//!
//! ## Top clicked elements
//!
//! - <label>: <count>
//! ```

use std::fmt::Write as _;
use std::path::Path;

use analytics_core::error::{AnalyticsError, Result};
use chrono::NaiveDate;

use crate::aggregator::Accumulator;

/// Render `acc` as the report text for `today`, listing at most `top_n` labels.
///
/// Pure: the same accumulator, date and limit always give the same bytes.
pub fn render_report(acc: &Accumulator, today: NaiveDate, top_n: usize) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# Analytics Report ({})", today.format("%Y-%m-%d"));
    out.push('\n');

    out.push_str("## Visits per day\n\n");
    for (day, visits) in &acc.visits_per_day {
        let _ = writeln!(
            out,
            "- {}: {} visits, {} unique IPs",
            day,
            visits.visits,
            visits.unique_ips.len()
        );
    }
    out.push('\n');

    out.push_str("## Session duration\n\n");
    let _ = writeln!(
        out,
        "- Average session duration: {:.1} seconds (based on {} sessions)",
        acc.average_session_seconds(),
        acc.session_count
    );
    out.push('\n');

    out.push_str("## Top clicked elements\n\n");
    for (label, count) in acc.clicks.most_common(top_n) {
        let _ = writeln!(out, "- {}: {}", label, count);
    }

    out
}

/// Write `content` to `path`, creating the parent directory if absent.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    let write_err = |source| AnalyticsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)
}

/// Today's calendar date on the machine running the job.
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
