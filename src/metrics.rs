//! Derived aggregates over the filtered table.
//!
//! Every function here is pure and leaves its input untouched; each render
//! pass recomputes from scratch. Gap metrics are derived after filtering,
//! so they always describe the rows actually displayed.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Event, EventRecord};

/// Rows in the strongest-events table.
const STRONGEST_LIMIT: usize = 10;

/// One value per calendar day, for charting as a time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// Count of events sharing one distinct magnitude value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub magnitude: f64,
    pub count: usize,
}

/// The full metrics report for one filtered table.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Exact row count of the filtered table
    pub total_count: usize,
    /// Mean gap between events in the last 24 hours, in minutes;
    /// `None` means "no data" (fewer than two events in the window)
    pub gap_24h_minutes: Option<f64>,
    /// Per-day average gap between consecutive events, in minutes
    pub daily_gap_averages: Vec<DailyValue>,
    /// Per-day maximum magnitude
    pub daily_max_magnitude: Vec<DailyValue>,
    /// Event count per distinct magnitude value, ascending
    pub magnitude_histogram: Vec<HistogramBin>,
    /// Strongest events, magnitude descending
    pub strongest: Vec<EventRecord>,
}

impl MetricsReport {
    /// Compute all metrics over an already-filtered table.
    ///
    /// `now` anchors the 24-hour window and is injected so tests can use
    /// a fixed clock.
    #[must_use]
    pub fn compute(events: &[Event], now: DateTime<Utc>) -> Self {
        Self {
            total_count: events.len(),
            gap_24h_minutes: gap_24h(events, now),
            daily_gap_averages: daily_gap_averages(events),
            daily_max_magnitude: daily_max_magnitude(events),
            magnitude_histogram: magnitude_histogram(events),
            strongest: strongest(events, STRONGEST_LIMIT)
                .iter()
                .map(EventRecord::from)
                .collect(),
        }
    }
}

/// Per-day average of day-level gaps between consecutive events.
///
/// Rows are ordered by calendar date; each row's gap is the minute
/// difference between its date and its predecessor's. The first row has
/// no predecessor and is dropped. Gaps are then grouped by date and
/// averaged within each day.
#[must_use]
pub fn daily_gap_averages(events: &[Event]) -> Vec<DailyValue> {
    let mut dates: Vec<NaiveDate> = events.iter().map(|e| e.date_only).collect();
    dates.sort_unstable();

    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for pair in dates.windows(2) {
        let gap_minutes = pair[1].signed_duration_since(pair[0]).num_minutes() as f64;
        let entry = groups.entry(pair[1]).or_insert((0.0, 0));
        entry.0 += gap_minutes;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(date, (sum, count))| DailyValue {
            date,
            value: sum / count as f64,
        })
        .collect()
}

/// Mean gap, in minutes, between successive events of the last 24 hours.
///
/// Returns `None` when the window holds fewer than two events, never a
/// NaN average.
#[must_use]
pub fn gap_24h(events: &[Event], now: DateTime<Utc>) -> Option<f64> {
    let cutoff = now - Duration::hours(24);

    let mut window: Vec<DateTime<Utc>> = events
        .iter()
        .map(|e| e.timestamp)
        .filter(|t| *t >= cutoff)
        .collect();
    window.sort_unstable();

    if window.len() < 2 {
        return None;
    }

    let total_minutes: f64 = window
        .windows(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]).num_seconds() as f64 / 60.0)
        .sum();

    Some(total_minutes / (window.len() - 1) as f64)
}

/// Maximum magnitude per calendar day, date ascending.
///
/// Rows without a numeric magnitude are dropped here, where magnitude is
/// required.
#[must_use]
pub fn daily_max_magnitude(events: &[Event]) -> Vec<DailyValue> {
    let mut groups: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for event in events {
        if let Some(mag) = event.magnitude {
            groups
                .entry(event.date_only)
                .and_modify(|max| *max = max.max(mag))
                .or_insert(mag);
        }
    }

    groups
        .into_iter()
        .map(|(date, value)| DailyValue { date, value })
        .collect()
}

/// Event count per distinct magnitude value, ascending by magnitude.
#[must_use]
pub fn magnitude_histogram(events: &[Event]) -> Vec<HistogramBin> {
    let mut magnitudes: Vec<f64> = events.iter().filter_map(|e| e.magnitude).collect();
    magnitudes.sort_unstable_by(f64::total_cmp);

    let mut bins: Vec<HistogramBin> = Vec::new();
    for mag in magnitudes {
        match bins.last_mut() {
            Some(bin) if bin.magnitude == mag => bin.count += 1,
            _ => bins.push(HistogramBin {
                magnitude: mag,
                count: 1,
            }),
        }
    }
    bins
}

/// The `limit` strongest events, magnitude descending, ties in original
/// table order.
#[must_use]
pub fn strongest(events: &[Event], limit: usize) -> Vec<Event> {
    let mut ranked: Vec<Event> = events
        .iter()
        .filter(|e| e.magnitude.is_some())
        .cloned()
        .collect();

    // Stable sort keeps the original order within equal magnitudes.
    ranked.sort_by(|a, b| {
        let a_mag = a.magnitude.unwrap_or(f64::NEG_INFINITY);
        let b_mag = b.magnitude.unwrap_or(f64::NEG_INFINITY);
        b_mag.total_cmp(&a_mag)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_at(timestamp: DateTime<Utc>, magnitude: Option<f64>, location: &str) -> Event {
        Event {
            timestamp,
            date_only: timestamp.date_naive(),
            gmt_time: timestamp.time(),
            local_time: timestamp.time(),
            latitude: 37.17,
            longitude: 37.08,
            depth_km: Some(7.0),
            magnitude,
            location: location.to_string(),
            country: "Türkiye".to_string(),
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn test_total_count_is_exact_row_count() {
        let events = vec![
            event_at(at(6, 1, 0), Some(7.7), "a"),
            event_at(at(6, 2, 0), None, "b"),
            event_at(at(7, 3, 0), Some(5.0), "c"),
        ];

        let report = MetricsReport::compute(&events, at(8, 0, 0));
        assert_eq!(report.total_count, 3);
    }

    #[test]
    fn test_gap_24h_two_rows_one_minute_apart() {
        let now = at(6, 12, 0);
        let events = vec![
            event_at(at(6, 10, 0), Some(4.0), "a"),
            event_at(at(6, 10, 1), Some(4.1), "b"),
        ];

        let gap = gap_24h(&events, now);
        assert_eq!(gap, Some(1.0));
    }

    #[test]
    fn test_gap_24h_no_data_for_sparse_windows() {
        let now = at(10, 0, 0);
        assert_eq!(gap_24h(&[], now), None);

        let one = vec![event_at(at(9, 12, 0), Some(4.0), "a")];
        assert_eq!(gap_24h(&one, now), None);

        // Two rows, but both outside the window
        let stale = vec![
            event_at(at(6, 1, 0), Some(4.0), "a"),
            event_at(at(6, 2, 0), Some(4.1), "b"),
        ];
        assert_eq!(gap_24h(&stale, now), None);
    }

    #[test]
    fn test_gap_24h_excludes_older_rows() {
        let now = at(10, 0, 0);
        let events = vec![
            event_at(at(6, 1, 0), Some(4.0), "stale"),
            event_at(at(9, 12, 0), Some(4.1), "a"),
            event_at(at(9, 12, 30), Some(4.2), "b"),
        ];

        // Only the two in-window rows count: one 30-minute gap.
        assert_eq!(gap_24h(&events, now), Some(30.0));
    }

    #[test]
    fn test_daily_gap_averages_drops_first_row() {
        // Three rows on Feb 6, one on Feb 7: Feb 6 gets two 0-minute gaps
        // (the first row contributes none), Feb 7 one 1440-minute gap.
        let events = vec![
            event_at(at(6, 1, 0), Some(7.7), "a"),
            event_at(at(6, 2, 0), Some(7.6), "b"),
            event_at(at(6, 3, 0), Some(6.0), "c"),
            event_at(at(7, 4, 0), Some(5.0), "d"),
        ];

        let averages = daily_gap_averages(&events);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].date.to_string(), "2023-02-06");
        assert!((averages[0].value - 0.0).abs() < f64::EPSILON);
        assert_eq!(averages[1].date.to_string(), "2023-02-07");
        assert!((averages[1].value - 1440.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_daily_max_magnitude_skips_missing() {
        let events = vec![
            event_at(at(6, 1, 0), Some(7.7), "a"),
            event_at(at(6, 2, 0), Some(7.6), "b"),
            event_at(at(7, 3, 0), None, "c"),
            event_at(at(7, 4, 0), Some(5.0), "d"),
        ];

        let maxima = daily_max_magnitude(&events);
        assert_eq!(maxima.len(), 2);
        assert!((maxima[0].value - 7.7).abs() < f64::EPSILON);
        assert!((maxima[1].value - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_magnitude_histogram_counts_distinct_values() {
        let events = vec![
            event_at(at(6, 1, 0), Some(4.5), "a"),
            event_at(at(6, 2, 0), Some(4.5), "b"),
            event_at(at(6, 3, 0), Some(7.7), "c"),
            event_at(at(6, 4, 0), None, "d"),
        ];

        let bins = magnitude_histogram(&events);
        assert_eq!(
            bins,
            vec![
                HistogramBin {
                    magnitude: 4.5,
                    count: 2
                },
                HistogramBin {
                    magnitude: 7.7,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_strongest_descending_stable_and_bounded() {
        let events = vec![
            event_at(at(6, 1, 0), Some(3.1), "a"),
            event_at(at(6, 2, 0), Some(7.2), "b"),
            event_at(at(6, 3, 0), Some(5.0), "first-5.0"),
            event_at(at(6, 4, 0), Some(5.0), "second-5.0"),
            event_at(at(6, 5, 0), None, "no-mag"),
        ];

        let top = strongest(&events, 10);
        assert_eq!(top.len(), 4);

        let magnitudes: Vec<f64> = top.iter().filter_map(|e| e.magnitude).collect();
        assert_eq!(magnitudes, vec![7.2, 5.0, 5.0, 3.1]);

        // Ties keep original table order
        assert_eq!(top[1].location, "first-5.0");
        assert_eq!(top[2].location, "second-5.0");

        // Every entry comes from the input
        for event in &top {
            assert!(events.iter().any(|e| e.location == event.location));
        }

        assert_eq!(strongest(&events, 2).len(), 2);
    }

    #[test]
    fn test_filtered_example_preserves_order_in_top10() {
        // Magnitudes [3.1, 7.2, 5.0, 4.4] filtered to [4.0, 8.0] leave
        // [7.2, 5.0, 4.4]; the top-10 over that subset is the same list.
        let events = vec![
            event_at(at(6, 1, 0), Some(7.2), "a"),
            event_at(at(6, 2, 0), Some(5.0), "b"),
            event_at(at(6, 3, 0), Some(4.4), "c"),
        ];

        let top = strongest(&events, 10);
        let magnitudes: Vec<f64> = top.iter().filter_map(|e| e.magnitude).collect();
        assert_eq!(magnitudes, vec![7.2, 5.0, 4.4]);
    }

    #[test]
    fn test_empty_table_degrades_gracefully() {
        let report = MetricsReport::compute(&[], at(6, 0, 0));
        assert_eq!(report.total_count, 0);
        assert_eq!(report.gap_24h_minutes, None);
        assert!(report.daily_gap_averages.is_empty());
        assert!(report.daily_max_magnitude.is_empty());
        assert!(report.magnitude_histogram.is_empty());
        assert!(report.strongest.is_empty());
    }
}
