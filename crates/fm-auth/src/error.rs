//! Error types for fmdata-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for fmdata-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fmdata-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
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

    /// Envelope code if the server rejected a session request.
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns true if no response reached the client.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    /// Returns true if the response could not be understood.
    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol(_))
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The server answered a session request with a non-zero code
    /// (bad account/password, unknown token, ...).
    #[error("Session request rejected: {code} - {message}")]
    Rejected { code: String, message: String },

    /// No response reached the client.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response was not a valid envelope or lacked the token.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The credential store failed.
    #[error("Credential store error: {0}")]
    Storage(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Storage(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Storage(err.to_string()), err)
    }
}

impl From<fmdata_client::Error> for Error {
    fn from(err: fmdata_client::Error) -> Self {
        use fmdata_client::ErrorKind as ClientKind;

        let kind = match &err.kind {
            ClientKind::Transport(_) | ClientKind::Timeout => ErrorKind::Transport(err.to_string()),
            ClientKind::Protocol(_) | ClientKind::Json(_) => ErrorKind::Protocol(err.to_string()),
            ClientKind::Domain { code, message, .. } => ErrorKind::Rejected {
                code: code.clone(),
                message: message.clone(),
            },
            ClientKind::InvalidUrl(_) | ClientKind::Config(_) => {
                ErrorKind::InvalidCredentials(err.to_string())
            }
        };
        Error::with_source(kind, err)
    }
}

impl From<fmdata_client::ProjectionError> for Error {
    fn from(err: fmdata_client::ProjectionError) -> Self {
        Error::with_source(ErrorKind::Protocol(err.to_string()), err)
    }
}
