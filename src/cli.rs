//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::filters::MagnitudeRange;
use crate::output::Format;

/// AFAD earthquake dashboard pipeline: fetch, filter, aggregate, export.
#[derive(Parser, Debug)]
#[command(name = "aftershock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch and list filtered events (one-shot fetch and exit)
    Snapshot(SnapshotArgs),

    /// Fetch and print the metrics report
    Report(ReportArgs),

    /// Fetch and write the CSV export file
    Export(ExportArgs),

    /// Start the dashboard server
    Serve(ServeArgs),
}

/// Arguments for the `snapshot` command.
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Start date (YYYY-MM-DD, defaults to the configured window)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Magnitude range filter: min,max (inclusive)
    #[arg(long, value_parser = parse_magnitude_range)]
    pub magnitude: Option<MagnitudeRange>,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `report` command.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Start date (YYYY-MM-DD, defaults to the configured window)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Magnitude range filter: min,max (inclusive)
    #[arg(long, value_parser = parse_magnitude_range)]
    pub magnitude: Option<MagnitudeRange>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `export` command.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Start date (YYYY-MM-DD, defaults to the configured window)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Magnitude range filter: min,max (inclusive)
    #[arg(long, value_parser = parse_magnitude_range)]
    pub magnitude: Option<MagnitudeRange>,

    /// Output file path
    #[arg(long, short = 'o', default_value = crate::output::EXPORT_FILENAME)]
    pub output: PathBuf,
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

/// Parse a calendar date from string.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}"))
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a magnitude range from string.
fn parse_magnitude_range(s: &str) -> Result<MagnitudeRange, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2023-02-06").is_ok());
        assert!(parse_date("02/06/2023").is_err());
    }

    #[test]
    fn test_parse_magnitude_range() {
        let range = parse_magnitude_range("4.0,8.0").unwrap();
        assert!((range.min - 4.0).abs() < 0.001);
        assert!(parse_magnitude_range("8.0,4.0").is_err());
    }
}
