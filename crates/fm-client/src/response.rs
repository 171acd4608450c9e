//! Transport-level HTTP responses.

use std::sync::OnceLock;

use bytes::Bytes;

use crate::envelope::{DecodeError, Envelope};

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response from status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as a Data API envelope.
    pub fn envelope(&self) -> Result<Envelope, DecodeError> {
        Envelope::decode(&self.body)
    }

    /// Body as lossy text, sanitized for logs and error messages.
    pub fn body_preview(&self) -> String {
        sanitize_error_message(&String::from_utf8_lossy(&self.body))
    }
}

fn bearer_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"(?i)(bearer|basic)\s+[A-Za-z0-9._~+/=-]+")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

fn token_field_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r#""token"\s*:\s*"[^"]*""#)
            .unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// Sanitize a server-provided message before it lands in an error or a log.
///
/// This function:
/// - Redacts `Bearer`/`Basic` credentials
/// - Redacts `"token": "..."` pairs echoed back in JSON
/// - Truncates messages longer than 500 characters
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = bearer_pattern()
        .replace_all(message, "$1 [REDACTED]")
        .to_string();
    sanitized = token_field_pattern()
        .replace_all(&sanitized, r#""token":"[REDACTED]""#)
        .to_string();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
