use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

/// Day key used when no timestamp candidate parses.
pub const UNKNOWN_DAY: &str = "unknown";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimestampResolver ─────────────────────────────────────────────────────────

/// Parses event timestamps and buckets them into calendar days.
///
/// Accepted inputs:
/// * JSON number → Unix epoch **milliseconds** (integer or float).
/// * eight-digit string → basic ISO-8601 date `YYYYMMDD`.
/// * other all-digit string → Unix epoch milliseconds.
/// * RFC 3339 string with `Z` or an explicit offset.
/// * naive `YYYY-MM-DDTHH:MM[:SS[.f]]`, `YYYY-MM-DD HH:MM:SS[.f]` or
///   `YYYY-MM-DD`, read in the bucketing zone (or UTC when suffixed `Z`).
///
/// Days are rendered as `YYYY-MM-DD` in the bucketing zone, UTC by default.
#[derive(Debug, Clone, Copy)]
pub struct TimestampResolver {
    zone: Tz,
}

impl Default for TimestampResolver {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimestampResolver {
    /// Resolver that buckets by UTC calendar day.
    pub fn utc() -> Self {
        Self { zone: Tz::UTC }
    }

    /// Create a resolver for the given IANA zone name.
    ///
    /// `"local"` / `"auto"` select the system zone. An unrecognised name falls
    /// back to UTC and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = match tz_name.trim().to_lowercase().as_str() {
            "local" | "auto" => get_system_timezone(),
            _ => tz_name.trim().to_string(),
        };
        let zone = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimestampResolver: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { zone }
    }

    /// The zone used for day bucketing and for naive timestamps.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Validate a `--timezone` value: an IANA identifier, `local` or `auto`.
    pub fn validate_timezone(tz_name: &str) -> bool {
        let name = tz_name.trim();
        name.eq_ignore_ascii_case("local")
            || name.eq_ignore_ascii_case("auto")
            || name.parse::<Tz>().is_ok()
    }

    /// Parse one timestamp candidate into a UTC instant.
    pub fn parse(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => self.parse_str(s.trim()),
            Value::Number(n) => {
                if let Some(ms) = n.as_i64() {
                    DateTime::from_timestamp_millis(ms)
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite())
                        .and_then(|f| DateTime::from_timestamp_millis(f.trunc() as i64))
                }
            }
            _ => None,
        }
    }

    /// Calendar day of `ts` in the bucketing zone.
    pub fn day_key(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.zone).format("%Y-%m-%d").to_string()
    }

    /// Day key from the first candidate that parses, or [`UNKNOWN_DAY`].
    pub fn resolve_day(&self, candidates: &[Option<&Value>]) -> String {
        candidates
            .iter()
            .flatten()
            .find_map(|v| self.parse(v))
            .map(|ts| self.day_key(ts))
            .unwrap_or_else(|| UNKNOWN_DAY.to_string())
    }

    fn parse_str(&self, s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            if s.len() == 8 {
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                    return localize(self.zone, date.and_hms_opt(0, 0, 0)?);
                }
            }
            return s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        // A bare `Z` on an otherwise naive string still means UTC.
        let (naive_part, zone) = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            Some(stripped) => (stripped, Tz::UTC),
            None => (s, self.zone),
        };

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, fmt) {
                return localize(zone, naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(naive_part, "%Y-%m-%d") {
            return localize(zone, date.and_hms_opt(0, 0, 0)?);
        }

        debug!("TimestampResolver: could not parse timestamp \"{}\"", s);
        None
    }
}

/// Read a wall-clock time in `zone`.
///
/// Ambiguous times take the earlier instant. A time skipped by a
/// spring-forward transition is shifted past the gap, so it keeps its date.
fn localize(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
