//! Error type definitions.
//!
//! The taxonomy follows four failure classes with different recovery
//! policies:
//!
//! - [`EstimateError::InvalidParameter`]: always surfaced to the caller,
//!   never retried.
//! - [`LoadError`]: fails the affected URL only; batch runs catch it and
//!   skip the URL.
//! - Hosting lookup failures are not an error type at all: they degrade to
//!   "unknown hosting" inside the resolver and never propagate.
//! - [`DatabaseError`]: logged by the caller; a batch run continues.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// A page load that could not be measured.
///
/// Every variant is a per-URL failure: the batch scheduler logs it and moves
/// on, the query endpoint maps it to a server-side failure status.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The browser process could not be started or did not publish its
    /// DevTools endpoint in time.
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    /// The DevTools WebSocket session failed (connect, send, or an
    /// unparseable protocol message).
    #[error("DevTools session error: {0}")]
    Session(String),

    /// Navigation was rejected by the browser (DNS failure, connection
    /// refused, bad scheme, ...).
    #[error("Navigation to {url} failed: {reason}")]
    Navigation {
        /// The URL that failed to navigate.
        url: String,
        /// Error text reported by the browser.
        reason: String,
    },

    /// The page kept issuing requests past the hard wait ceiling.
    #[error("Page did not reach network quiescence within {0:.1}s")]
    QuiescenceTimeout(f64),
}

/// Errors surfaced by the estimation entry points.
#[derive(Error, Debug)]
pub enum EstimateError {
    /// A caller-supplied parameter is out of range or unknown. Never retried.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The underlying page measurement failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Categories counted by [`super::ProcessingStats`] during a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    BrowserLaunchError,
    SessionError,
    NavigationError,
    QuiescenceTimeout,
    HostingLookupFailure,
    InvalidParameterError,
    PersistenceError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::BrowserLaunchError => "Browser launch error",
            ErrorType::SessionError => "DevTools session error",
            ErrorType::NavigationError => "Navigation error",
            ErrorType::QuiescenceTimeout => "Network quiescence timeout",
            ErrorType::HostingLookupFailure => "Hosting lookup failure",
            ErrorType::InvalidParameterError => "Invalid parameter",
            ErrorType::PersistenceError => "Persistence error",
        }
    }
}

impl From<&LoadError> for ErrorType {
    fn from(e: &LoadError) -> Self {
        match e {
            LoadError::BrowserLaunch(_) => ErrorType::BrowserLaunchError,
            LoadError::Session(_) => ErrorType::SessionError,
            LoadError::Navigation { .. } => ErrorType::NavigationError,
            LoadError::QuiescenceTimeout(_) => ErrorType::QuiescenceTimeout,
        }
    }
}

impl From<&EstimateError> for ErrorType {
    fn from(e: &EstimateError) -> Self {
        match e {
            EstimateError::InvalidParameter(_) => ErrorType::InvalidParameterError,
            EstimateError::Load(load) => ErrorType::from(load),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(
            ErrorType::QuiescenceTimeout.as_str(),
            "Network quiescence timeout"
        );
        assert_eq!(
            ErrorType::HostingLookupFailure.as_str(),
            "Hosting lookup failure"
        );
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_load_error_maps_to_error_type() {
        let e = LoadError::QuiescenceTimeout(30.0);
        assert_eq!(ErrorType::from(&e), ErrorType::QuiescenceTimeout);

        let e = LoadError::Navigation {
            url: "https://example.com".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert_eq!(ErrorType::from(&e), ErrorType::NavigationError);
    }

    #[test]
    fn test_estimate_error_display() {
        let e = EstimateError::InvalidParameter("dataCacheRatio must be within [0, 1]".into());
        assert!(e.to_string().contains("dataCacheRatio"));
    }
}
