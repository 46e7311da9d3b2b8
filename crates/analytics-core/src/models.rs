use serde_json::Value;

/// Sentinel used for a missing client address or click label.
pub const UNKNOWN: &str = "unknown";

/// Semantic type of a single user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A page load, attributed to a day and a client address.
    PageView,
    /// The end of a browsing session, carrying its duration.
    SessionEnd,
    /// A click on a labelled element.
    Click,
    /// Any other type string. Tolerated and ignored by the aggregator.
    Other(String),
}

impl EventKind {
    /// Map the raw `type` field to a kind. A missing or non-string type is
    /// `Other("")`.
    pub fn from_type(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("pageview") => EventKind::PageView,
            Some("session_end") => EventKind::SessionEnd,
            Some("click") => EventKind::Click,
            Some(other) => EventKind::Other(other.to_string()),
            None => EventKind::Other(String::new()),
        }
    }
}

/// One user action inside a record's `payload.events`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Event-level timestamp, kept raw so the resolver can decide its format.
    pub ts: Option<Value>,
    /// Session length in milliseconds (`session_end` only, defaults to 0).
    pub duration_ms: u64,
    /// Click label (`click` only, defaults to [`UNKNOWN`]).
    pub label: String,
}

impl Event {
    /// Decode an event from JSON. Returns `None` when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let label = obj
            .get("label")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Some(Self {
            kind: EventKind::from_type(obj.get("type")),
            ts: present(obj.get("ts")),
            duration_ms: obj.get("duration_ms").map(duration_from).unwrap_or(0),
            label,
        })
    }
}

/// One line of the retriever's output: a collector envelope around a
/// client-sent payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Client address, [`UNKNOWN`] when absent.
    pub ip: String,
    /// Collector ingestion timestamp.
    pub received_at: Option<Value>,
    /// Payload-level timestamp shared by all events of the batch.
    pub payload_ts: Option<Value>,
    /// Decoded events; empty when `payload.events` is absent or not an array.
    pub events: Vec<Event>,
}

impl RawRecord {
    /// Decode a record from a parsed JSON line.
    ///
    /// Never fails for an object: every field is optional and a field of an
    /// unexpected type is treated as absent. Returns `None` only when `value`
    /// is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let ip = obj
            .get("ip")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        let payload = obj.get("payload").and_then(Value::as_object);

        let events = payload
            .and_then(|p| p.get("events"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Event::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            ip,
            received_at: present(obj.get("received_at")),
            payload_ts: present(payload.and_then(|p| p.get("ts"))),
            events,
        })
    }

    /// Timestamp candidates for `event`, in resolution order:
    /// event `ts`, then payload `ts`, then `received_at`.
    pub fn timestamp_candidates<'a>(&'a self, event: &'a Event) -> [Option<&'a Value>; 3] {
        [
            event.ts.as_ref(),
            self.payload_ts.as_ref(),
            self.received_at.as_ref(),
        ]
    }
}

/// Treat JSON `null` the same as a missing key.
fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Non-negative integral milliseconds; fractions truncate, anything else is 0.
fn duration_from(value: &Value) -> u64 {
    if let Some(ms) = value.as_u64() {
        return ms;
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}
