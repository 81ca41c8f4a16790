//! Geocoding error types.

use outpost_core::OutpostError;
use thiserror::Error;

/// Errors raised while talking to the geocoding service.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered 429.
    #[error("rate limited by geocoding service")]
    RateLimited,

    /// Any other non-success status.
    #[error("geocoding service returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The response body was not the expected shape.
    #[error("failed to parse geocoding response: {0}")]
    Parse(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl GeocodingError {
    /// Whether another attempt might succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Http(_) => true,
            Self::Status { status } => *status >= 500,
            Self::Parse(_) | Self::Client(_) => false,
        }
    }
}

/// Result type alias for geocoding operations.
pub type Result<T> = std::result::Result<T, GeocodingError>;

impl From<GeocodingError> for OutpostError {
    fn from(err: GeocodingError) -> Self {
        Self::Geocoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeocodingError::Status { status: 503 };
        assert_eq!(err.to_string(), "geocoding service returned HTTP 503");
    }

    #[test]
    fn test_retriable_classification() {
        assert!(GeocodingError::RateLimited.is_retriable());
        assert!(GeocodingError::Status { status: 502 }.is_retriable());
        assert!(!GeocodingError::Status { status: 403 }.is_retriable());
        assert!(!GeocodingError::Parse("bad json".to_string()).is_retriable());
    }

    #[test]
    fn test_into_outpost_error() {
        let err: OutpostError = GeocodingError::RateLimited.into();
        assert!(matches!(err, OutpostError::Geocoding(ref msg) if msg.contains("rate limited")));
    }
}
