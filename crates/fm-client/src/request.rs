//! Transport-level HTTP requests.

use bytes::Bytes;

use crate::security::redact_session_token;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Upper-case verb, as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }

    /// Whether a JSON body (and content type) accompanies this verb.
    pub fn carries_body(&self) -> bool {
        matches!(self, RequestMethod::Post | RequestMethod::Patch)
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential attached to one request.
///
/// Secrets are redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Authorization: Basic <secret>`, secret already base64 encoded.
    Basic(String),
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// No authorization header.
    None,
}

impl Authorization {
    /// Value for the `Authorization` header, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            Authorization::Basic(secret) => Some(format!("Basic {}", secret)),
            Authorization::Bearer(token) => Some(format!("Bearer {}", token)),
            Authorization::None => None,
        }
    }

    /// Returns true for bearer credentials.
    pub fn is_bearer(&self) -> bool {
        matches!(self, Authorization::Bearer(_))
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authorization::Basic(_) => f.write_str("Basic([REDACTED])"),
            Authorization::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Authorization::None => f.write_str("None"),
        }
    }
}

/// A fully resolved request, ready for a [`Transport`](crate::Transport).
///
/// Debug output redacts the Authorization header and session tokens in the URL.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: RequestMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach the authorization header, if the credential has one.
    pub fn authorization(self, auth: &Authorization) -> Self {
        match auth.header_value() {
            Some(value) => self.header("Authorization", value),
            None => self,
        }
    }

    /// Set a JSON body and content type.
    pub fn json_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self.header("Content-Type", "application/json")
    }

    /// Look up a header by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The URL with any session token in the path replaced, for logs.
    pub fn redacted_url(&self) -> String {
        redact_session_token(&self.url)
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("Authorization") {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}
