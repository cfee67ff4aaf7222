//! Output formatters for events and metrics.
//!
//! Supports human-readable (with colors), JSON, and CSV formats, plus the
//! CSV file export the dashboard offers as a download.

use std::io::Write;
use std::path::Path;

use crate::errors::AftershockError;
use crate::metrics::MetricsReport;
use crate::models::{Event, EventRecord};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude-based colors
const RED: &str = "\x1b[91m"; // Critical: mag >= 7.0
const YELLOW: &str = "\x1b[93m"; // Warning: mag >= 6.0
const CYAN: &str = "\x1b[96m"; // Significant: mag >= 4.5
const GREEN: &str = "\x1b[92m"; // Moderate: mag >= 3.0
const WHITE: &str = "\x1b[97m"; // Minor: mag < 3.0

/// Default filename for the CSV export.
pub const EXPORT_FILENAME: &str = "earthquake_data.csv";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("unknown format: {s} (expected: human, json, csv)")),
        }
    }
}

/// Get the color code for a magnitude value.
fn magnitude_color(mag: Option<f64>) -> &'static str {
    match mag {
        Some(m) if m >= 7.0 => RED,
        Some(m) if m >= 6.0 => YELLOW,
        Some(m) if m >= 4.5 => CYAN,
        Some(m) if m >= 3.0 => GREEN,
        _ => WHITE,
    }
}

/// Get severity label for magnitude.
fn magnitude_label(mag: Option<f64>) -> &'static str {
    match mag {
        Some(m) if m >= 7.0 => "MAJOR",
        Some(m) if m >= 6.0 => "STRONG",
        Some(m) if m >= 4.5 => "MODERATE",
        Some(m) if m >= 3.0 => "LIGHT",
        Some(m) if m >= 2.0 => "MINOR",
        _ => "MICRO",
    }
}

/// Render a gap in minutes as "HH:MM", or "no data" when absent.
#[must_use]
pub fn format_gap(minutes: Option<f64>) -> String {
    match minutes {
        None => "no data".to_string(),
        Some(m) => {
            let whole = m.round().max(0.0) as i64;
            format!("{:02}:{:02}", whole / 60, whole % 60)
        }
    }
}

/// Write events in human-readable format with colors.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[Event]) -> Result<(), AftershockError> {
    for event in events {
        let time = event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let mag_str = event
            .magnitude
            .map(|m| format!("{m:.1}"))
            .unwrap_or_else(|| "?".into());
        let depth = event
            .depth_km
            .map(|d| format!("{d:>5.0}km"))
            .unwrap_or_else(|| "    ?".into());

        let color = magnitude_color(event.magnitude);
        let label = magnitude_label(event.magnitude);

        writeln!(
            writer,
            "{color}{BOLD}M{mag_str}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth}{RESET} │ \
             {time} GMT │ \
             {}",
            event.location
        )?;
    }
    Ok(())
}

/// Write events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[Event]) -> Result<(), AftershockError> {
    let records: Vec<EventRecord> = events.iter().map(EventRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Write events as CSV with a header row.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_csv<W: Write>(writer: &mut W, events: &[Event]) -> Result<(), AftershockError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for event in events {
        csv_writer.serialize(EventRecord::from(event))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[Event],
    format: Format,
) -> Result<(), AftershockError> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Csv => write_csv(writer, events),
    }
}

/// Render the filtered table as CSV bytes, UTF-8 encoded.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn csv_bytes(events: &[Event]) -> Result<Vec<u8>, AftershockError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, events)?;
    Ok(buffer)
}

/// Write the CSV export file.
///
/// # Errors
///
/// Returns an error if serialization or the filesystem write fails.
pub fn export_csv(path: &Path, events: &[Event]) -> Result<(), AftershockError> {
    let bytes = csv_bytes(events)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Write a human-readable metrics report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &MetricsReport,
) -> Result<(), AftershockError> {
    writeln!(writer, "{BOLD}Total earthquakes:{RESET} {}", report.total_count)?;
    writeln!(
        writer,
        "{BOLD}Average gap, last 24h:{RESET} {}",
        format_gap(report.gap_24h_minutes)
    )?;

    if !report.daily_max_magnitude.is_empty() {
        writeln!(writer, "\n{BOLD}Daily max magnitude{RESET}")?;
        for day in &report.daily_max_magnitude {
            writeln!(writer, "  {}  M{:.1}", day.date, day.value)?;
        }
    }

    if !report.daily_gap_averages.is_empty() {
        writeln!(writer, "\n{BOLD}Average gap per day (minutes){RESET}")?;
        for day in &report.daily_gap_averages {
            writeln!(writer, "  {}  {:.1}", day.date, day.value)?;
        }
    }

    if !report.magnitude_histogram.is_empty() {
        writeln!(writer, "\n{BOLD}Magnitude distribution{RESET}")?;
        for bin in &report.magnitude_histogram {
            writeln!(writer, "  M{:.1}  {}", bin.magnitude, bin.count)?;
        }
    }

    if !report.strongest.is_empty() {
        writeln!(writer, "\n{BOLD}Strongest earthquakes{RESET}")?;
        for record in &report.strongest {
            let mag = record
                .magnitude
                .map(|m| format!("{m:.1}"))
                .unwrap_or_else(|| "?".into());
            writeln!(
                writer,
                "  M{mag}  {}  {}",
                record.timestamp, record.location
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_events() -> Vec<Event> {
        [7.7, 5.0, 4.4]
            .into_iter()
            .enumerate()
            .map(|(i, mag)| {
                let timestamp = Utc
                    .with_ymd_and_hms(2023, 2, 6, 1, 17 + i as u32, 32)
                    .single()
                    .unwrap();
                Event {
                    timestamp,
                    date_only: timestamp.date_naive(),
                    gmt_time: timestamp.time(),
                    local_time: timestamp.time(),
                    latitude: 37.17,
                    longitude: 37.08,
                    depth_km: Some(7.0),
                    magnitude: Some(mag),
                    location: format!("Pazarcik-{i} (Kahramanmaras)"),
                    country: "Türkiye".to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert!("ndjson".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_gap() {
        assert_eq!(format_gap(None), "no data");
        assert_eq!(format_gap(Some(1.0)), "00:01");
        assert_eq!(format_gap(Some(133.4)), "02:13");
    }

    #[test]
    fn test_csv_round_trip_preserves_rows_and_magnitudes() {
        let events = sample_events();
        let bytes = csv_bytes(&events).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let records: Vec<EventRecord> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("re-parse exported CSV");

        assert_eq!(records.len(), events.len());

        let mut exported: Vec<f64> = records.iter().filter_map(|r| r.magnitude).collect();
        let mut original: Vec<f64> = events.iter().filter_map(|e| e.magnitude).collect();
        exported.sort_unstable_by(f64::total_cmp);
        original.sort_unstable_by(f64::total_cmp);
        assert_eq!(exported.len(), original.len());
        for (a, b) in exported.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_csv_has_header_row() {
        let bytes = csv_bytes(&sample_events()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap_or_default();
        assert!(header.contains("timestamp"));
        assert!(header.contains("magnitude"));
        assert!(header.contains("latitude"));
    }

    #[test]
    fn test_write_events_all_formats() {
        let events = sample_events();
        for format in [Format::Human, Format::Json, Format::Csv] {
            let mut buffer = Vec::new();
            write_events(&mut buffer, &events, format).unwrap();
            assert!(!buffer.is_empty());
        }
    }
}
