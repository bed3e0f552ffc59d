//! Transport error types.

use thiserror::Error;

/// Raised when no HTTP response could be obtained.
///
/// A non-2xx status is not an error at this layer; it is returned as a status
/// code and classified by the caller.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection-level failure reported by a non-reqwest transport.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Host, port or URN do not form a valid endpoint URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The HTTP client could not be built.
    #[error("Client initialization failed: {0}")]
    Init(String),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display() {
        let err = TransportError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn invalid_endpoint_display() {
        let err = TransportError::InvalidEndpoint("empty host".to_string());
        assert_eq!(err.to_string(), "Invalid endpoint: empty host");
    }
}
