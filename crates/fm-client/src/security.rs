//! Security utilities for building Data API paths.
//!
//! Layout names, record ids and session tokens are interpolated into URL
//! paths. They MUST go through [`url::encode_segment`] so that a value such
//! as `Bands/../../sessions` cannot escape its path segment.
//!
//! ```rust
//! use fmdata_client::security::url;
//!
//! let layout = url::encode_segment("Bands & Venues");
//! let path = format!("/layouts/{}/records", layout);
//! assert_eq!(path, "/layouts/Bands%20%26%20Venues/records");
//! ```

/// URL path-segment utilities.
pub mod url {
    /// Percent-encode a value for use as a single path segment.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fmdata_client::security::url;
    ///
    /// assert_eq!(url::encode_segment("12/../../x"), "12%2F..%2F..%2Fx");
    /// ```
    #[must_use]
    pub fn encode_segment(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

/// Replace the token in a `/sessions/{token}` path or URL, for logs.
///
/// ```rust
/// use fmdata_client::security::redact_session_token;
///
/// assert_eq!(redact_session_token("/sessions/abc123"), "/sessions/[REDACTED]");
/// assert_eq!(redact_session_token("/layouts/Bands/records"), "/layouts/Bands/records");
/// ```
#[must_use]
pub fn redact_session_token(path: &str) -> String {
    const SESSIONS_SEGMENT: &str = "/sessions/";

    match path.find(SESSIONS_SEGMENT) {
        Some(idx) => format!("{}{}[REDACTED]", &path[..idx], SESSIONS_SEGMENT),
        None => path.to_string(),
    }
}
