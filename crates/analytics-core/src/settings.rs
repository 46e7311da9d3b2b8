use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{AnalyticsError, Result};
use crate::time_utils::TimestampResolver;

/// Default output file of the folder retriever.
pub const DEFAULT_OUTPUT_FILE: &str = "raw_logs.jsonl";

/// Default number of labels in the "Top clicked elements" section.
pub const DEFAULT_TOP_N: u32 = 30;

/// Default overall timeout of the URL source, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ── fetch-logs ────────────────────────────────────────────────────────────────

/// Fetch raw analytics event logs and write them as JSON Lines
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fetch-logs",
    about = "Fetch raw analytics event logs and write them as JSON Lines",
    version
)]
pub struct FetchSettings {
    #[command(subcommand)]
    pub source: FetchSource,

    /// Logging level
    #[arg(long, global = true, env = "ANALYTICS_LOG_LEVEL", default_value = "info", value_parser = LOG_LEVELS)]
    pub log_level: String,
}

/// Where the raw logs come from.
#[derive(Subcommand, Debug, Clone)]
pub enum FetchSource {
    /// Download every file in a Google Drive folder
    Drive(DriveArgs),
    /// Download a single export from an HTTP endpoint
    Url(UrlArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DriveArgs {
    /// Drive folder id
    #[arg(long, env = "ANALYTICS_DRIVE_FOLDER_ID")]
    pub folder_id: String,

    /// Service-account key: raw JSON or a path to the key file
    #[arg(long, env = "GCP_SA_KEY_JSON", hide_env_values = true)]
    pub credentials: String,

    /// Output JSONL path
    #[arg(long, env = "OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct UrlArgs {
    /// Source URL
    #[arg(long, env = "ANALYTICS_LOGS_URL")]
    pub url: String,

    /// Bearer token sent as `Authorization: Bearer <token>`
    #[arg(long, env = "ANALYTICS_LOGS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Overall request timeout in seconds (1-3600)
    #[arg(long, env = "ANALYTICS_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Output JSONL path
    pub output: PathBuf,
}

impl FetchSettings {
    /// Reject blank required values. clap only checks presence, and an
    /// exported-but-empty variable still counts as present.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            FetchSource::Drive(args) => {
                require("ANALYTICS_DRIVE_FOLDER_ID", &args.folder_id)?;
                require("GCP_SA_KEY_JSON", &args.credentials)?;
                require_path("OUTPUT_FILE", &args.output)
            }
            FetchSource::Url(args) => {
                require("ANALYTICS_LOGS_URL", &args.url)?;
                require_path("output", &args.output)
            }
        }
    }

    /// Destination of the JSONL output for either source.
    pub fn output(&self) -> &PathBuf {
        match &self.source {
            FetchSource::Drive(args) => &args.output,
            FetchSource::Url(args) => &args.output,
        }
    }
}

impl UrlArgs {
    /// Bearer token with blank values treated as absent.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

// ── process-analytics ─────────────────────────────────────────────────────────

/// Aggregate raw JSONL analytics logs into a Markdown report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "process-analytics",
    about = "Aggregate raw JSONL analytics logs into a Markdown report",
    version
)]
pub struct AggregateSettings {
    /// Input JSONL file
    pub input: PathBuf,

    /// Output report file
    pub output: PathBuf,

    /// Timezone for day bucketing: an IANA name, or "local"
    #[arg(long, env = "ANALYTICS_TIMEZONE", default_value = "UTC", value_parser = parse_timezone)]
    pub timezone: String,

    /// Number of labels listed under "Top clicked elements" (1-1000)
    #[arg(long, env = "ANALYTICS_TOP_N", default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub top: u32,

    /// Logging level
    #[arg(long, env = "ANALYTICS_LOG_LEVEL", default_value = "info", value_parser = LOG_LEVELS)]
    pub log_level: String,
}

fn parse_timezone(value: &str) -> std::result::Result<String, String> {
    if TimestampResolver::validate_timezone(value) {
        Ok(value.trim().to_string())
    } else {
        Err(format!(
            "unknown timezone \"{}\" (expected an IANA name such as Europe/Berlin, or \"local\")",
            value
        ))
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnalyticsError::Config(format!("{} required", name)));
    }
    Ok(())
}

fn require_path(name: &str, value: &std::path::Path) -> Result<()> {
    if value.as_os_str().is_empty() {
        return Err(AnalyticsError::Config(format!("{} must not be empty", name)));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_source_positional_output() {
        let s = FetchSettings::try_parse_from([
            "fetch-logs",
            "url",
            "--url",
            "https://logs.example.com/export",
            "--token",
            "s3cret",
            "out/raw.jsonl",
        ])
        .unwrap();

        match &s.source {
            FetchSource::Url(args) => {
                assert_eq!(args.url, "https://logs.example.com/export");
                assert_eq!(args.bearer_token(), Some("s3cret"));
                assert_eq!(args.timeout_secs, DEFAULT_TIMEOUT_SECS);
            }
            other => panic!("expected url source, got {:?}", other),
        }
        assert_eq!(s.output(), &PathBuf::from("out/raw.jsonl"));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_url_source_requires_output() {
        let res = FetchSettings::try_parse_from([
            "fetch-logs",
            "url",
            "--url",
            "https://logs.example.com/export",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_drive_source_default_output() {
        let s = FetchSettings::try_parse_from([
            "fetch-logs",
            "drive",
            "--folder-id",
            "1AbCdEf",
            "--credentials",
            "/etc/sa.json",
        ])
        .unwrap();
        assert_eq!(s.output(), &PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_blank_values() {
        let s = FetchSettings::try_parse_from([
            "fetch-logs",
            "drive",
            "--folder-id",
            "  ",
            "--credentials",
            "{}",
        ])
        .unwrap();
        let err = s.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: ANALYTICS_DRIVE_FOLDER_ID required"
        );
    }

    #[test]
    fn test_blank_token_is_absent() {
        let s = FetchSettings::try_parse_from([
            "fetch-logs",
            "url",
            "--url",
            "http://localhost/logs",
            "--token",
            " ",
            "raw.jsonl",
        ])
        .unwrap();
        let FetchSource::Url(args) = &s.source else {
            panic!("expected url source");
        };
        assert_eq!(args.bearer_token(), None);
    }

    #[test]
    fn test_log_level_is_global() {
        let s = FetchSettings::try_parse_from([
            "fetch-logs",
            "url",
            "--url",
            "http://localhost/logs",
            "raw.jsonl",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn test_aggregate_two_positionals() {
        let s = AggregateSettings::try_parse_from([
            "process-analytics",
            "raw_logs.jsonl",
            "reports/analytics.md",
        ])
        .unwrap();
        assert_eq!(s.input, PathBuf::from("raw_logs.jsonl"));
        assert_eq!(s.output, PathBuf::from("reports/analytics.md"));
        assert_eq!(s.top, DEFAULT_TOP_N);
        assert_eq!(s.timezone, "UTC");
    }

    #[test]
    fn test_aggregate_wrong_arg_count_is_usage_error() {
        assert!(AggregateSettings::try_parse_from(["process-analytics", "raw_logs.jsonl"]).is_err());
        assert!(AggregateSettings::try_parse_from(["process-analytics", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_aggregate_top_range() {
        assert!(AggregateSettings::try_parse_from(["process-analytics", "a", "b", "--top", "0"]).is_err());
        let s = AggregateSettings::try_parse_from(["process-analytics", "a", "b", "--top", "5"]).unwrap();
        assert_eq!(s.top, 5);
    }

    #[test]
    fn test_aggregate_timezone_values() {
        let s = AggregateSettings::try_parse_from([
            "process-analytics",
            "a",
            "b",
            "--timezone",
            "America/New_York",
        ])
        .unwrap();
        assert_eq!(s.timezone, "America/New_York");

        let s = AggregateSettings::try_parse_from(["process-analytics", "a", "b", "--timezone", "local"])
            .unwrap();
        assert_eq!(s.timezone, "local");

        assert!(AggregateSettings::try_parse_from([
            "process-analytics",
            "a",
            "b",
            "--timezone",
            "Mars/Olympus_Mons",
        ])
        .is_err());
    }
}
