mod bootstrap;

use analytics_core::settings::AggregateSettings;
use analytics_core::time_utils::TimestampResolver;
use analytics_data::aggregator::aggregate_file;
use analytics_data::report::{render_report, today_local, write_report};
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let settings = AggregateSettings::parse();

    bootstrap::setup_logging(&settings.log_level)?;

    let resolver = TimestampResolver::new(&settings.timezone);
    tracing::info!(
        "Aggregating {} (days bucketed in {})",
        settings.input.display(),
        resolver.zone()
    );

    let (acc, stats) = aggregate_file(&settings.input, &resolver)
        .with_context(|| format!("cannot aggregate {}", settings.input.display()))?;

    tracing::info!(
        lines = stats.lines,
        blank = stats.blank_lines,
        records = stats.records,
        malformed = stats.malformed_lines,
        events = acc.events_seen,
        ignored = acc.ignored_events,
        "Input read"
    );

    let report = render_report(&acc, today_local(), settings.top as usize);
    write_report(&settings.output, &report)?;

    tracing::info!(
        "Report: {} day(s), {} visit(s), {} session(s), {} distinct click label(s)",
        acc.visits_per_day.len(),
        acc.total_visits(),
        acc.session_count,
        acc.clicks.len()
    );
    println!("Wrote report to {}", settings.output.display());
    Ok(())
}
