//! Range filters over normalized events.
//!
//! Two independent inclusive-bounds predicates: a calendar date range
//! (also used to parameterize the fetch) and a magnitude range. Filtering
//! always returns a new collection; inputs are never mutated, so the
//! stage stays composable and re-runnable on every parameter change.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::errors::AftershockError;
use crate::models::Event;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a validated range.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AftershockError> {
        if start > end {
            return Err(AftershockError::InvalidRange(format!(
                "start date {start} must be <= end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// First instant of the range, widened to the start of day.
    #[must_use]
    pub fn start_datetime(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last instant of the range, widened to 23:59:59.999.
    #[must_use]
    pub fn end_datetime(&self) -> DateTime<Utc> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.end.and_time(end_of_day).and_utc()
    }

    /// Check if a calendar date falls within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Inclusive magnitude range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeRange {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeRange {
    /// Create a validated range.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is non-finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, AftershockError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(AftershockError::InvalidRange(format!(
                "magnitude bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(AftershockError::InvalidRange(format!(
                "min magnitude {min} must be <= max magnitude {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Check if a magnitude falls within the range.
    #[must_use]
    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.min && magnitude <= self.max
    }
}

impl std::str::FromStr for MagnitudeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(format!(
                "magnitude range requires 2 values (min,max), got {}",
                parts.len()
            ));
        }

        let vals: Result<Vec<f64>, _> = parts.iter().map(|p| p.trim().parse::<f64>()).collect();
        let vals = vals.map_err(|e| format!("invalid number in magnitude range: {e}"))?;

        Self::new(vals[0], vals[1]).map_err(|e| e.to_string())
    }
}

/// Combined filter criteria over normalized events.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventFilter {
    pub date: Option<DateRange>,
    pub magnitude: Option<MagnitudeRange>,
}

impl EventFilter {
    /// Check if an event passes all filter criteria.
    ///
    /// An event without a numeric magnitude fails an active magnitude
    /// predicate.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.check_date(event) && self.check_magnitude(event)
    }

    /// Apply the filter, returning the surviving rows as a new collection.
    #[must_use]
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    fn check_date(&self, event: &Event) -> bool {
        match &self.date {
            None => true,
            Some(range) => range.contains(event.date_only),
        }
    }

    fn check_magnitude(&self, event: &Event) -> bool {
        match self.magnitude {
            None => true,
            Some(range) => event.magnitude.is_some_and(|m| range.contains(m)),
        }
    }
}
