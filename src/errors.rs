//! Error types for aftershock.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur in aftershock operations.
#[derive(Error, Debug)]
pub enum AftershockError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// API returned an error status
    #[error("AFAD API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Event date could not be parsed as a timestamp
    #[error("Unparseable event date {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    /// A required numeric field was not coercible
    #[error("Non-numeric {field} value {value:?}")]
    Coercion { field: &'static str, value: String },

    /// A range filter was malformed (bounds reversed or out of domain)
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// CSV writing or reading failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
