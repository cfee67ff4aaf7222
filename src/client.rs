//! AFAD event API client.
//!
//! Provides blocking HTTP access to the AFAD event filter endpoint.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, FetchCache};
use crate::config::Settings;
use crate::errors::AftershockError;
use crate::filters::DateRange;
use crate::models::RawEvent;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("aftershock/", env!("CARGO_PKG_VERSION"));

/// Query timestamp layout the AFAD endpoint expects.
const QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Client for the AFAD event API.
pub struct AfadClient {
    client: Client,
    endpoint: String,
}

impl AfadClient {
    /// Create a new AFAD client from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(settings: &Settings) -> Result<Self, AftershockError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// The memoization key for a window: both bounds exactly as queried.
    #[must_use]
    pub fn window_key(range: &DateRange) -> CacheKey {
        (
            range.start_datetime().format(QUERY_FORMAT).to_string(),
            range.end_datetime().format(QUERY_FORMAT).to_string(),
        )
    }

    /// Fetch raw events for a date window.
    ///
    /// Date-only bounds are widened to full-day timestamps before querying.
    /// Raises immediately on a non-2xx status rather than failing later
    /// during parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API returns an error
    /// status, or the body is not a JSON array of events.
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub fn fetch_window(&self, range: &DateRange) -> Result<Vec<RawEvent>, AftershockError> {
        let (start, end) = Self::window_key(range);

        debug!("fetching events from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("start", start.as_str()), ("end", end.as_str())])
            .send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AftershockError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // Read the body as text first so transport errors and malformed
        // JSON stay distinct error variants.
        let body = response.text()?;
        let events: Vec<RawEvent> = serde_json::from_str(&body)?;

        debug!("fetched {} events", events.len());
        Ok(events)
    }

    /// Fetch a window through the memoization cache.
    ///
    /// An exact-key hit skips the network entirely; a miss fetches and
    /// stores the result before returning it.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_window`](Self::fetch_window) on a cache miss.
    pub fn fetch_window_cached(
        &self,
        cache: &mut FetchCache,
        range: &DateRange,
    ) -> Result<Vec<RawEvent>, AftershockError> {
        let key = Self::window_key(range);

        if let Some(events) = cache.get(&key) {
            debug!("cache hit for window {:?}", key);
            return Ok(events);
        }

        let events = self.fetch_window(range)?;
        cache.insert(key, events.clone());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_window_key_formats_widened_bounds() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 2, 6).unwrap(),
            NaiveDate::from_ymd_opt(2023, 2, 10).unwrap(),
        )
        .unwrap();

        let (start, end) = AfadClient::window_key(&range);
        assert_eq!(start, "2023-02-06 00:00:00");
        assert_eq!(end, "2023-02-10 23:59:59");
    }
}
