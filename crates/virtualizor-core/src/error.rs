//! Error types for Virtualizor operations.
//!
//! Every operation either succeeds or fails with exactly one of these kinds.
//! Nothing in the client retries or degrades a failure into a partial result.

use std::fmt;
use thiserror::Error;

/// Main error type for Virtualizor operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required parameter is missing or invalid; raised before any network call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The HTTP exchange could not be completed
    #[error("Transport error ({kind}): {message}")]
    TransportError {
        /// Failure category
        kind: TransportErrorKind,
        /// Underlying cause
        message: String,
    },

    /// The panel answered with something that is not the expected JSON
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the body
        message: String,
        /// Raw body bytes, kept for diagnostics
        body: Vec<u8>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Specialized result type for Virtualizor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure or TLS handshake failure
    Connect,
    /// The configured request timeout expired
    Timeout,
    /// The request could not be sent or the connection was reset
    Request,
    /// The response body could not be read to completion
    Body,
}

impl TransportErrorKind {
    /// Returns the kind as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Request => "request",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Build a transport error of the given kind.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::TransportError {
            kind,
            message: message.into(),
        }
    }

    /// Build a malformed-response error carrying the offending body.
    pub fn malformed(message: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::TransportError {
                kind: TransportErrorKind::Timeout,
                ..
            } => "TIMEOUT",
            Self::TransportError { .. } => "TRANSPORT_ERROR",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Returns true if the request timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::TransportError {
                kind: TransportErrorKind::Timeout,
                ..
            }
        )
    }

    /// Returns the raw response body of a malformed response, lossily decoded.
    #[must_use]
    pub fn body_lossy(&self) -> Option<String> {
        match self {
            Self::MalformedResponse { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        Self::transport(kind, err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("Invalid panel URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            Error::transport(TransportErrorKind::Connect, "refused").error_code(),
            "TRANSPORT_ERROR"
        );
        assert_eq!(
            Error::transport(TransportErrorKind::Timeout, "slow").error_code(),
            "TIMEOUT"
        );
        assert_eq!(
            Error::malformed("bad", b"<html>".to_vec()).error_code(),
            "MALFORMED_RESPONSE"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ValidationError("vpsid is required".to_string());
        assert_eq!(err.to_string(), "Validation error: vpsid is required");

        let err = Error::transport(TransportErrorKind::Connect, "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error (connect): connection refused"
        );
    }

    #[test]
    fn test_timeout_is_transport_subtype() {
        let err = Error::transport(TransportErrorKind::Timeout, "operation timed out");
        assert!(err.is_timeout());
        assert!(matches!(err, Error::TransportError { .. }));
        assert!(!Error::transport(TransportErrorKind::Request, "reset").is_timeout());
    }

    #[test]
    fn test_body_lossy() {
        let err = Error::malformed("not JSON", b"<html>error</html>".to_vec());
        assert_eq!(err.body_lossy().as_deref(), Some("<html>error</html>"));
        assert!(Error::ConfigError("x".into()).body_lossy().is_none());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::ValidationError("test".to_string());
        let err2 = Error::ValidationError("test".to_string());
        let err3 = Error::ValidationError("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
