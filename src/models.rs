//! Data models for AFAD event API responses.
//!
//! The AFAD filter endpoint returns a flat JSON array of event objects in
//! which every numeric field is a string. Coercion to numeric types is the
//! normalizer's job; deserialization stays faithful to the wire shape.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event exactly as the AFAD API returns it.
///
/// Fields the API sometimes omits default to empty strings so one missing
/// key does not reject the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Stable event identifier
    #[serde(rename = "eventID", default)]
    pub event_id: String,

    /// Event time as "YYYY-MM-DDTHH:MM:SS" (GMT)
    #[serde(default)]
    pub date: String,

    /// Latitude in decimal degrees, as a string
    #[serde(default)]
    pub latitude: String,

    /// Longitude in decimal degrees, as a string
    #[serde(default)]
    pub longitude: String,

    /// Depth in kilometers, as a string
    #[serde(default)]
    pub depth: String,

    /// Magnitude value, as a string; may be empty
    #[serde(default)]
    pub magnitude: String,

    /// Human-readable place description
    #[serde(default)]
    pub location: String,

    /// Country name, diacritics included
    #[serde(default)]
    pub country: String,

    /// Province name, when inside Türkiye
    #[serde(default)]
    pub province: String,
}

/// A normalized event: parsed timestamp, derived time columns, coerced
/// coordinates.
///
/// `magnitude` stays optional because the feed occasionally carries events
/// with an empty or non-numeric magnitude; such rows are dropped only at
/// the point a numeric magnitude is required.
#[derive(Debug, Clone)]
pub struct Event {
    /// Absolute event time (source is GMT)
    pub timestamp: DateTime<Utc>,
    /// Calendar date of `timestamp`
    pub date_only: NaiveDate,
    /// Time-of-day of `timestamp`
    pub gmt_time: NaiveTime,
    /// Time-of-day after the configured local offset is applied
    pub local_time: NaiveTime,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Depth in kilometers, when coercible
    pub depth_km: Option<f64>,
    /// Magnitude, when coercible
    pub magnitude: Option<f64>,
    /// Place description
    pub location: String,
    /// Country name
    pub country: String,
}

/// Flat event view for JSON and CSV output.
///
/// Times are pre-formatted strings so the CSV columns match what the
/// dashboard displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub date: String,
    pub gmt_time: String,
    pub local_time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: Option<f64>,
    pub magnitude: Option<f64>,
    pub location: String,
    pub country: String,
}

impl From<&Event> for EventRecord {
    fn from(e: &Event) -> Self {
        Self {
            timestamp: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            date: e.date_only.format("%Y-%m-%d").to_string(),
            gmt_time: e.gmt_time.format("%H:%M:%S").to_string(),
            local_time: e.local_time.format("%H:%M:%S").to_string(),
            latitude: e.latitude,
            longitude: e.longitude,
            depth_km: e.depth_km,
            magnitude: e.magnitude,
            location: e.location.clone(),
            country: e.country.clone(),
        }
    }
}
