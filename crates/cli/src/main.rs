//! dcmap CLI - assign subnets to datacenters from vantage point latencies.

use anyhow::{Context, Result};
use dcmap::RunOutput;
use dcmap_core::{Config, Credentials};
use dcmap_ingestion::HttpSource;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn print_summary(output: &RunOutput) {
    let summary = &output.report.summary;

    info!("DC assignment summary");
    info!("  Vantage points used: {}/{}", output.succeeded, output.attempted);
    info!("  Total subnets analyzed: {}", summary.total_subnets);
    info!("  Successfully assigned: {}", summary.assigned_subnets);
    info!("  Undefined assignments: {}", summary.undefined_subnets);
    info!("  High confidence: {}", summary.confidence_levels.high);
    info!("  Unknown: {}", summary.confidence_levels.unknown);
    for path in &output.written {
        info!("  Wrote {}", path.display());
    }
}

fn main() -> Result<()> {
    setup_logging();

    let config = Config::default();
    let credentials =
        Credentials::from_env(&config.source).context("Failed to resolve source credentials")?;
    let source = HttpSource::new(credentials);

    let output = dcmap::run(&config, &source).map_err(|err| {
        error!("Run aborted: {err}");
        err
    })?;

    print_summary(&output);
    Ok(())
}
