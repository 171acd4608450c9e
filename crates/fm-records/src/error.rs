//! Error type for record operations.
//!
//! Every failure is classified into one of four kinds. Envelope codes and
//! messages are kept verbatim (after credential redaction) so callers can
//! branch on them.

use fmdata_client::ProjectionError;

/// Result type alias for fmdata-records operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Envelope code for a find or list that matched nothing.
pub const NO_RECORDS_MATCH_CODE: &str = "401";

/// Envelope code for an id that does not exist.
pub const RECORD_MISSING_CODE: &str = "101";

pub use fmdata_auth::INVALID_TOKEN_CODE;

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No response reached the client.
    Transport,
    /// The response was unparseable or lacked the expected shape.
    Protocol,
    /// No valid token could be obtained.
    Auth,
    /// The server answered with a non-zero envelope code.
    Domain,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApiErrorKind::Transport => "Transport",
            ApiErrorKind::Protocol => "Protocol",
            ApiErrorKind::Auth => "Auth",
            ApiErrorKind::Domain => "Domain",
        };
        f.write_str(name)
    }
}

/// A classified failure of one record operation.
///
/// `code` is the envelope code for [`ApiErrorKind::Domain`] errors and for
/// [`ApiErrorKind::Auth`] errors the server rejected; otherwise it is empty.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error{}: {message}", code_suffix(.code))]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub kind: ApiErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn code_suffix(code: &str) -> String {
    if code.is_empty() {
        String::new()
    } else {
        format!(" {}", code)
    }
}

impl ApiError {
    /// Create an error without a source.
    pub fn new(kind: ApiErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            kind,
            source: None,
        }
    }

    /// Attach the underlying error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ApiErrorKind::Transport
    }

    pub fn is_protocol(&self) -> bool {
        self.kind == ApiErrorKind::Protocol
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }

    pub fn is_domain(&self) -> bool {
        self.kind == ApiErrorKind::Domain
    }

    /// A find or list matched no records (code `"401"`).
    ///
    /// Not an authorization failure despite the number.
    pub fn is_no_records_match(&self) -> bool {
        self.is_domain() && self.code == NO_RECORDS_MATCH_CODE
    }

    /// The server rejected the session token (code `"952"`).
    pub fn is_invalid_token(&self) -> bool {
        self.is_domain() && self.code == INVALID_TOKEN_CODE
    }

    /// The addressed record does not exist (code `"101"`).
    pub fn is_record_missing(&self) -> bool {
        self.is_domain() && self.code == RECORD_MISSING_CODE
    }
}

impl From<fmdata_client::Error> for ApiError {
    fn from(err: fmdata_client::Error) -> Self {
        use fmdata_client::ErrorKind as ClientKind;

        let (kind, code, message) = match &err.kind {
            ClientKind::Transport(_) | ClientKind::Timeout => {
                (ApiErrorKind::Transport, String::new(), err.to_string())
            }
            ClientKind::Domain { code, message, .. } => {
                (ApiErrorKind::Domain, code.clone(), message.clone())
            }
            ClientKind::Protocol(_)
            | ClientKind::Json(_)
            | ClientKind::InvalidUrl(_)
            | ClientKind::Config(_) => (ApiErrorKind::Protocol, String::new(), err.to_string()),
        };

        ApiError::new(kind, code, message).with_source(err)
    }
}

impl From<fmdata_auth::Error> for ApiError {
    fn from(err: fmdata_auth::Error) -> Self {
        let code = err.code().unwrap_or_default().to_string();
        ApiError::new(ApiErrorKind::Auth, code, err.to_string()).with_source(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::new(ApiErrorKind::Protocol, "", err.to_string()).with_source(err)
    }
}
