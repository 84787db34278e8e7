//! Unified error handling for the ride-tracker library.
//!
//! Only a few failures ever reach a caller: invalid state transitions, position
//! stream failures, and persistence writes. Elevation lookups and persistence
//! reads degrade to default values instead (see [`ResultExt::or_fallback`]).

use thiserror::Error;

use crate::recorder::{PositionError, RecorderState};

/// Unified error type for ride-tracker operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    /// Operation is not valid in the recorder's current state
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: RecorderState,
    },
    /// The position source refused to start a watch
    #[error("Geolocation not supported")]
    GeolocationUnsupported,
    /// The position stream reported a failure
    #[error("Geolocation error: {0}")]
    PositionSource(PositionError),
    /// A ride was requested before any position fix arrived
    #[error("No position fix recorded")]
    NoFix,
    /// The current recording has already been saved
    #[error("Ride already saved")]
    AlreadySaved,
    /// HTTP/API error
    #[error("HTTP error{}: {message}", status_suffix(.status_code))]
    Http {
        message: String,
        status_code: Option<u16>,
    },
    /// Malformed data from an external source
    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
    /// Persistence/storage error
    #[error("Persistence error: {message}")]
    Persistence { message: String },
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl RideError {
    /// Helper constructor for state-machine violations.
    pub fn invalid_state(operation: &'static str, state: RecorderState) -> Self {
        RideError::InvalidState { operation, state }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl ToString) -> Self {
        RideError::Parse {
            context: context.into(),
            details: details.to_string(),
        }
    }

    /// Helper constructor for persistence errors.
    pub fn persistence(message: impl Into<String>) -> Self {
        RideError::Persistence {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RideError {
    fn from(err: serde_json::Error) -> Self {
        RideError::parse("JSON", err)
    }
}

#[cfg(feature = "persistence")]
impl From<rusqlite::Error> for RideError {
    fn from(err: rusqlite::Error) -> Self {
        RideError::persistence(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RideError {
    fn from(err: reqwest::Error) -> Self {
        RideError::Http {
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
        }
    }
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code.map(|code| format!(" ({})", code)).unwrap_or_default()
}

/// Result type alias for ride-tracker operations.
pub type Result<T> = std::result::Result<T, RideError>;

/// Extension trait for converting Option to RideError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a missing-fix error.
    fn ok_or_no_fix(self) -> Result<T>;

    /// Convert Option to Result with a parse error.
    fn ok_or_parse(self, context: &str, details: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_no_fix(self) -> Result<T> {
        self.ok_or(RideError::NoFix)
    }

    fn ok_or_parse(self, context: &str, details: &str) -> Result<T> {
        self.ok_or_else(|| RideError::parse(context, details))
    }
}

/// Extraction-with-default for best-effort operations.
pub trait ResultExt<T> {
    /// Return the value, or log the error under `context` and return `fallback`.
    fn or_fallback(self, fallback: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn or_fallback(self, fallback: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[{}] {}, using fallback", context, e);
                fallback
            }
        }
    }
}
