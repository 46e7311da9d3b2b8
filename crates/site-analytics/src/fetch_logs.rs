mod bootstrap;

use std::time::Duration;

use analytics_core::settings::{FetchSettings, FetchSource};
use analytics_fetch::credentials::ServiceAccountKey;
use analytics_fetch::drive::{DriveClient, DriveRetriever};
use analytics_fetch::http::UrlRetriever;
use analytics_fetch::retrieve_to_file;
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let settings = FetchSettings::parse();

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::info!("fetch-logs v{} starting", env!("CARGO_PKG_VERSION"));

    // Configuration problems must surface before any remote I/O.
    settings.validate()?;

    let summary = match &settings.source {
        FetchSource::Drive(args) => {
            let key = ServiceAccountKey::load(&args.credentials)?;
            let client = DriveClient::connect(&key)
                .context("failed to obtain a Google Drive access token")?;
            let source = DriveRetriever::new(client, args.folder_id.clone());
            retrieve_to_file(&source, &args.output)
                .with_context(|| format!("failed to fetch folder {}", args.folder_id))?
        }
        FetchSource::Url(args) => {
            let source = UrlRetriever::new(
                args.url.clone(),
                args.bearer_token().map(str::to_string),
                Duration::from_secs(args.timeout_secs),
            )?;
            tracing::info!("GET {} (timeout {}s)", source.url(), args.timeout_secs);
            retrieve_to_file(&source, &args.output)
                .with_context(|| format!("failed to fetch {}", args.url))?
        }
    };

    println!("Wrote combined logs to {}", summary.path.display());
    Ok(())
}
