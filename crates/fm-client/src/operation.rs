//! Operation descriptors: the uniform shape of one Data API call.

use serde_json::Value;

use crate::request::RequestMethod;

/// Which credential a descriptor is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Session token from the session manager.
    Bearer,
    /// The static basic-auth secret. Only session creation uses this.
    Basic,
    /// No credential (session deletion carries the token in its path).
    None,
}

/// Method, database-relative path and optional JSON payload of one call.
///
/// Built per call and consumed once. Path segments taken from user input
/// must already be encoded (see [`crate::security::url`]).
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub method: RequestMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub payload: Option<Value>,
    pub auth: AuthScheme,
}

impl OperationDescriptor {
    /// Create a bearer-authenticated descriptor.
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: None,
            auth: AuthScheme::Bearer,
        }
    }

    /// GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, path)
    }

    /// POST descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, path)
    }

    /// PATCH descriptor.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Patch, path)
    }

    /// DELETE descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, path)
    }

    /// Attach a JSON payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Override the credential scheme.
    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    /// Whether a session token must be obtained before sending.
    pub fn requires_auth(&self) -> bool {
        self.auth == AuthScheme::Bearer
    }

    /// Path plus encoded query string.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = serde_urlencoded::to_string(&self.query).unwrap_or_default();
        format!("{}?{}", self.path, query)
    }
}
