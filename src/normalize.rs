//! Normalization of raw AFAD records.
//!
//! Pure, no I/O: restrict to one country, parse the event date, derive the
//! day/time columns, coerce coordinates, and order by timestamp. Rows are
//! keyed by timestamp from here on; every downstream stage assumes the
//! ascending order this pass establishes.

use chrono::{Duration, NaiveDateTime};

use crate::errors::AftershockError;
use crate::models::{Event, RawEvent};

/// Timestamp layouts the AFAD feed has been observed to emit.
const DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Normalize raw records into ordered events.
///
/// Keeps only rows whose `country` equals `country` exactly (diacritics
/// matter: "Turkiye" does not match "Türkiye"). Latitude/longitude must be
/// numeric or the whole call fails; a non-numeric magnitude becomes `None`
/// and is dropped later, only where a numeric magnitude is required.
///
/// # Errors
///
/// Returns an error when a retained row has an unparseable date or a
/// non-numeric coordinate.
pub fn normalize(
    raw: &[RawEvent],
    country: &str,
    local_offset_hours: i64,
) -> Result<Vec<Event>, AftershockError> {
    let offset = Duration::hours(local_offset_hours);

    let mut events = Vec::with_capacity(raw.len());
    for record in raw.iter().filter(|r| r.country == country) {
        let timestamp = parse_timestamp(&record.date)?.and_utc();
        let local = timestamp + offset;

        events.push(Event {
            timestamp,
            date_only: timestamp.date_naive(),
            gmt_time: timestamp.time(),
            local_time: local.time(),
            latitude: coerce_f64("latitude", &record.latitude)?,
            longitude: coerce_f64("longitude", &record.longitude)?,
            depth_km: parse_optional_f64(&record.depth),
            magnitude: parse_optional_f64(&record.magnitude),
            location: record.location.clone(),
            country: record.country.clone(),
        });
    }

    events.sort_by_key(|e| e.timestamp);
    Ok(events)
}

/// Parse an event date, trying each known layout.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, AftershockError> {
    let mut last_err = None;
    for format in DATE_FORMATS {
        match NaiveDateTime::parse_from_str(value.trim(), format) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(source) => Err(AftershockError::Timestamp {
            value: value.to_string(),
            source,
        }),
        // Unreachable while DATE_FORMATS is non-empty; keep the error total.
        None => Err(AftershockError::InvalidRange(
            "no timestamp formats configured".to_string(),
        )),
    }
}

/// Coerce an optional numeric field; anything non-finite counts as absent.
fn parse_optional_f64(value: &str) -> Option<f64> {
    value.trim().parse().ok().filter(|v: &f64| v.is_finite())
}

/// Coerce a required numeric field.
fn coerce_f64(field: &'static str, value: &str) -> Result<f64, AftershockError> {
    value
        .trim()
        .parse()
        .map_err(|_| AftershockError::Coercion {
            field,
            value: value.to_string(),
        })
}
