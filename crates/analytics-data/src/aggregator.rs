//! Event aggregation by day and by event type.
//!
//! A single [`Accumulator`] is created empty, fed every record of one input
//! pass, and then handed to the report renderer.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use analytics_core::error::Result;
use analytics_core::models::{EventKind, RawRecord};
use analytics_core::time_utils::TimestampResolver;

use crate::reader::{open_jsonl, read_records, ReadStats};

// ── DayVisits ─────────────────────────────────────────────────────────────────

/// Page views attributed to one calendar day.
#[derive(Debug, Clone, Default)]
pub struct DayVisits {
    pub visits: u64,
    pub unique_ips: HashSet<String>,
}

// ── ClickCounter ──────────────────────────────────────────────────────────────

/// Click counts per label, remembering first-seen order for tie breaks.
#[derive(Debug, Clone, Default)]
pub struct ClickCounter {
    counts: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl ClickCounter {
    pub fn increment(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.counts.len());
                self.counts.push((label.to_string(), 1));
            }
        }
    }

    pub fn get(&self, label: &str) -> u64 {
        self.index.get(label).map(|&i| self.counts[i].1).unwrap_or(0)
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most clicked labels, highest count first. Equal counts keep
    /// first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        // `sort_by` is stable, which is what keeps ties in insertion order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Running state of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    /// Page views per day key, sorted ascending by key.
    pub visits_per_day: BTreeMap<String, DayVisits>,
    pub session_count: u64,
    pub total_session_ms: u64,
    pub clicks: ClickCounter,
    /// Events counted across all types, including ignored ones.
    pub events_seen: u64,
    /// Events whose type is not one of the three tracked kinds.
    pub ignored_events: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every event of `record` into the running totals.
    pub fn add_record(&mut self, record: &RawRecord, resolver: &TimestampResolver) {
        for event in &record.events {
            self.events_seen += 1;
            match &event.kind {
                EventKind::PageView => {
                    let day = resolver.resolve_day(&record.timestamp_candidates(event));
                    let entry = self.visits_per_day.entry(day).or_default();
                    entry.visits += 1;
                    entry.unique_ips.insert(record.ip.clone());
                }
                EventKind::SessionEnd => {
                    self.session_count += 1;
                    self.total_session_ms = self.total_session_ms.saturating_add(event.duration_ms);
                }
                EventKind::Click => self.clicks.increment(&event.label),
                EventKind::Other(_) => self.ignored_events += 1,
            }
        }
    }

    /// Mean session length in seconds, `0.0` when no session ended.
    pub fn average_session_seconds(&self) -> f64 {
        if self.session_count == 0 {
            return 0.0;
        }
        self.total_session_ms as f64 / self.session_count as f64 / 1000.0
    }

    /// Total page views across all days.
    pub fn total_visits(&self) -> u64 {
        self.visits_per_day.values().map(|d| d.visits).sum()
    }

    /// `true` when no tracked event has been folded in.
    pub fn is_empty(&self) -> bool {
        self.visits_per_day.is_empty() && self.session_count == 0 && self.clicks.is_empty()
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Accumulate every record readable from `reader`.
pub fn aggregate_lines<R: BufRead>(
    reader: R,
    resolver: &TimestampResolver,
) -> (Accumulator, ReadStats) {
    let mut acc = Accumulator::new();
    let stats = read_records(reader, |record| acc.add_record(&record, resolver));
    (acc, stats)
}

/// Accumulate every record of the JSONL file at `path`.
///
/// Fails only when the file cannot be opened; bad lines are skipped.
pub fn aggregate_file(path: &Path, resolver: &TimestampResolver) -> Result<(Accumulator, ReadStats)> {
    let reader = open_jsonl(path)?;
    Ok(aggregate_lines(reader, resolver))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn record(value: serde_json::Value) -> RawRecord {
        RawRecord::from_value(&value).unwrap()
    }

    fn aggregate(input: &str) -> Accumulator {
        aggregate_lines(Cursor::new(input.as_bytes()), &TimestampResolver::utc()).0
    }

    // ── pageviews ─────────────────────────────────────────────────────────────

    #[test]
    fn test_pageview_counts_visits_and_unique_ips() {
        let resolver = TimestampResolver::utc();
        let mut acc = Accumulator::new();
        for ip in ["1.1.1.1", "1.1.1.1", "2.2.2.2"] {
            acc.add_record(
                &record(json!({
                    "ip": ip,
                    "payload": {"events": [{"type": "pageview", "ts": "2024-01-05T10:00:00Z"}]}
                })),
                &resolver,
            );
        }

        let day = &acc.visits_per_day["2024-01-05"];
        assert_eq!(day.visits, 3);
        assert_eq!(day.unique_ips.len(), 2);
        assert_eq!(acc.total_visits(), 3);
    }

    #[test]
    fn test_pageview_without_ip_uses_unknown() {
        let acc = aggregate(r#"{"payload":{"events":[{"type":"pageview","ts":1704448800000}]}}"#);
        let day = &acc.visits_per_day["2024-01-05"];
        assert!(day.unique_ips.contains("unknown"));
    }

    #[test]
    fn test_pageview_timestamp_fallbacks() {
        let input = concat!(
            // event ts missing → payload ts
            r#"{"ip":"a","payload":{"ts":"2024-03-01T08:00:00Z","events":[{"type":"pageview"}]}}"#,
            "\n",
            // event and payload ts unparseable → received_at
            r#"{"ip":"b","received_at":"2024-03-02T08:00:00Z","payload":{"ts":"??","events":[{"type":"pageview","ts":"bad"}]}}"#,
            "\n",
            // nothing parses → unknown
            r#"{"ip":"c","payload":{"events":[{"type":"pageview"}]}}"#,
            "\n"
        );
        let acc = aggregate(input);
        let keys: Vec<&str> = acc.visits_per_day.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-03-01", "2024-03-02", "unknown"]);
    }

    // ── sessions ──────────────────────────────────────────────────────────────

    #[test]
    fn test_session_average() {
        let acc = aggregate(concat!(
            r#"{"payload":{"events":[{"type":"session_end","duration_ms":2000}]}}"#,
            "\n",
            r#"{"payload":{"events":[{"type":"session_end","duration_ms":4000}]}}"#,
            "\n"
        ));
        assert_eq!(acc.session_count, 2);
        assert_eq!(acc.total_session_ms, 6000);
        assert!((acc.average_session_seconds() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_session_missing_duration_counts_as_zero() {
        let acc = aggregate(
            r#"{"payload":{"events":[{"type":"session_end"},{"type":"session_end","duration_ms":3000}]}}"#,
        );
        assert_eq!(acc.session_count, 2);
        assert!((acc.average_session_seconds() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_average_with_no_sessions_is_zero() {
        let acc = Accumulator::new();
        assert_eq!(acc.average_session_seconds(), 0.0);
    }

    // ── clicks ────────────────────────────────────────────────────────────────

    #[test]
    fn test_click_labels_default_to_unknown() {
        let acc = aggregate(
            r#"{"payload":{"events":[{"type":"click","label":"cta"},{"type":"click"},{"type":"click","label":"cta"}]}}"#,
        );
        assert_eq!(acc.clicks.get("cta"), 2);
        assert_eq!(acc.clicks.get("unknown"), 1);
        assert_eq!(acc.clicks.len(), 2);
    }

    #[test]
    fn test_most_common_orders_by_count_then_first_seen() {
        let mut clicks = ClickCounter::default();
        for label in ["b", "a", "c", "a", "c", "d"] {
            clicks.increment(label);
        }
        // a and c tie at 2; a was seen first. b and d tie at 1; b first.
        assert_eq!(
            clicks.most_common(10),
            vec![("a", 2), ("c", 2), ("b", 1), ("d", 1)]
        );
        assert_eq!(clicks.most_common(1), vec![("a", 2)]);
    }

    #[test]
    fn test_most_common_caps_at_n() {
        let mut clicks = ClickCounter::default();
        for i in 0..45 {
            for _ in 0..(i % 7 + 1) {
                clicks.increment(&format!("label-{}", i));
            }
        }
        let top = clicks.most_common(30);
        assert_eq!(top.len(), 30);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    // ── tolerance ─────────────────────────────────────────────────────────────

    #[test]
    fn test_records_without_events_contribute_nothing() {
        let acc = aggregate(concat!(
            r#"{"ip":"1.1.1.1"}"#,
            "\n",
            r#"{"ip":"1.1.1.1","payload":{}}"#,
            "\n",
            r#"{"ip":"1.1.1.1","payload":{"events":[]}}"#,
            "\n",
            r#"{"ip":"1.1.1.1","payload":{"events":"nope"}}"#,
            "\n",
            r#"{"ip":"1.1.1.1","payload":null}"#,
            "\n"
        ));
        assert!(acc.is_empty());
        assert_eq!(acc.events_seen, 0);
    }

    #[test]
    fn test_other_event_types_ignored() {
        let acc = aggregate(r#"{"payload":{"events":[{"type":"scroll"},{"label":"x"},{"type":"pageview"}]}}"#);
        assert_eq!(acc.events_seen, 3);
        assert_eq!(acc.ignored_events, 2);
        assert_eq!(acc.total_visits(), 1);
        assert!(acc.clicks.is_empty());
    }

    #[test]
    fn test_malformed_lines_do_not_abort() {
        let (acc, stats) = aggregate_lines(
            Cursor::new(
                "garbage\n{\"payload\":{\"events\":[{\"type\":\"click\",\"label\":\"ok\"}]}}\n{\"unterminated\":\n"
                    .as_bytes(),
            ),
            &TimestampResolver::utc(),
        );
        assert_eq!(acc.clicks.get("ok"), 1);
        assert_eq!(stats.malformed_lines, 2);
        assert_eq!(stats.records, 1);
    }

    #[test]
    fn test_aggregate_file_missing_input() {
        let res = aggregate_file(
            Path::new("/tmp/does-not-exist-analytics-input.jsonl"),
            &TimestampResolver::utc(),
        );
        assert!(res.is_err());
    }
}
