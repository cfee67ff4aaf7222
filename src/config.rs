//! Runtime configuration for aftershock.
//!
//! Settings resolve from `.env` and the environment with defaults that
//! match the public AFAD deployment.

use std::env;

use serde::Deserialize;

/// Default AFAD event filter endpoint.
const DEFAULT_ENDPOINT: &str = "https://deprem.afad.gov.tr/apiv2/event/filter";

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Event filter endpoint URL.
    pub endpoint: String,
    /// Country events are restricted to (exact match, diacritics kept).
    pub country: String,
    /// Hours added to GMT when deriving local time-of-day.
    pub local_offset_hours: i64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Default fetch window in days when no start date is given.
    pub window_days: i64,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        let endpoint =
            env::var("AFTERSHOCK_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let country = env::var("AFTERSHOCK_COUNTRY").unwrap_or_else(|_| "Türkiye".to_string());
        let local_offset_hours = env::var("AFTERSHOCK_LOCAL_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let request_timeout_secs = env::var("AFTERSHOCK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let window_days = env::var("AFTERSHOCK_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            endpoint,
            country,
            local_offset_hours,
            request_timeout_secs,
            window_days,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            country: "Türkiye".to_string(),
            local_offset_hours: 3,
            request_timeout_secs: 10,
            window_days: 30,
        }
    }
}
