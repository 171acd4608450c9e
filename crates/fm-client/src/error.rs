//! Error types for fmdata-client.

use crate::envelope::{DecodeError, ProjectionError};

/// Result type alias for fmdata-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fmdata-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if no response reached the client.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_) | ErrorKind::Timeout)
    }

    /// Returns true if a response arrived but could not be understood.
    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol(_) | ErrorKind::Json(_))
    }

    /// Returns true if the server answered with a non-zero envelope code.
    pub fn is_domain(&self) -> bool {
        matches!(self.kind, ErrorKind::Domain { .. })
    }

    /// Envelope code for domain errors.
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Domain { code, .. } => Some(code),
            _ => None,
        }
    }

    /// HTTP status that accompanied a domain error.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Domain { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// The response body was not a well-formed envelope, or a projected
    /// field was missing.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The envelope carried a code other than `"0"`.
    #[error("Data API error {code}: {message}")]
    Domain {
        status: u16,
        code: String,
        message: String,
    },

    /// JSON serialization error for an outgoing payload.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::with_source(ErrorKind::Protocol(err.to_string()), err)
    }
}

impl From<ProjectionError> for Error {
    fn from(err: ProjectionError) -> Self {
        Error::with_source(ErrorKind::Protocol(err.to_string()), err)
    }
}
