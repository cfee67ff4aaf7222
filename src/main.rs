//! Aftershock - AFAD earthquake dashboard pipeline.
//!
//! Fetches earthquake records from the AFAD event API, restricts them to
//! one country, applies date and magnitude range filters, computes summary
//! metrics, and presents them on the terminal, as a CSV export, or through
//! a small dashboard server.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use tracing::error;

mod cache;
mod cli;
mod client;
mod config;
mod errors;
mod filters;
mod metrics;
mod models;
mod normalize;
mod output;
mod server;

use cache::FetchCache;
use cli::{Cli, Command};
use client::AfadClient;
use config::Settings;
use filters::{DateRange, EventFilter, MagnitudeRange};
use metrics::MetricsReport;
use models::Event;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let settings = Settings::load();

    match cli.command {
        Command::Snapshot(args) => cmd_snapshot(&settings, args),
        Command::Report(args) => cmd_report(&settings, args),
        Command::Export(args) => cmd_export(&settings, args),
        Command::Serve(args) => cmd_serve(settings, args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolve the fetch window from optional CLI bounds.
fn resolve_window(
    settings: &Settings,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DateRange> {
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(settings.window_days));
    DateRange::new(start, end).context("invalid date window")
}

/// Run the full pipeline once: fetch, normalize, filter.
fn run_pipeline(
    settings: &Settings,
    range: &DateRange,
    magnitude: Option<MagnitudeRange>,
) -> Result<Vec<Event>> {
    let client = AfadClient::new(settings).context("failed to create AFAD client")?;

    // One-shot commands still go through the cache so retried windows
    // within a process reuse the response.
    let mut cache = FetchCache::with_default_capacity();
    let raw = client
        .fetch_window_cached(&mut cache, range)
        .context("failed to fetch earthquake events")?;

    let events = normalize::normalize(&raw, &settings.country, settings.local_offset_hours)
        .context("failed to normalize events")?;

    let filter = EventFilter {
        date: Some(*range),
        magnitude,
    };
    Ok(filter.apply(&events))
}

/// Execute the `snapshot` command - fetch and list filtered events.
fn cmd_snapshot(settings: &Settings, args: cli::SnapshotArgs) -> Result<()> {
    let range = resolve_window(settings, args.start, args.end)?;
    let mut events = run_pipeline(settings, &range, args.magnitude)?;

    // Most recent first for listing
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;

    Ok(())
}

/// Execute the `report` command - fetch and print the metrics report.
fn cmd_report(settings: &Settings, args: cli::ReportArgs) -> Result<()> {
    let range = resolve_window(settings, args.start, args.end)?;
    let events = run_pipeline(settings, &range, args.magnitude)?;

    let report = MetricsReport::compute(&events, Utc::now());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let json = serde_json::to_string_pretty(&report)?;
        writeln!(handle, "{json}")?;
    } else {
        output::write_report(&mut handle, &report)?;
    }

    Ok(())
}

/// Execute the `export` command - fetch and write the CSV file.
fn cmd_export(settings: &Settings, args: cli::ExportArgs) -> Result<()> {
    let range = resolve_window(settings, args.start, args.end)?;
    let events = run_pipeline(settings, &range, args.magnitude)?;

    if events.is_empty() {
        tracing::warn!("selected range matched no events; writing header-only CSV");
    }

    output::export_csv(&args.output, &events)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(
        "wrote {} events to {}",
        events.len(),
        args.output.display()
    );
    Ok(())
}

/// Execute the `serve` command - start the dashboard server.
fn cmd_serve(settings: Settings, args: cli::ServeArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        settings,
    };

    let url = format!("http://{}:{}", args.host, args.port);
    println!("Aftershock dashboard");
    println!("  Local:  {url}");
    println!("Press Ctrl+C to stop\n");

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}
