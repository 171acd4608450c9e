//! Database endpoint resolution.

use crate::error::{Error, ErrorKind, Result};
use crate::security::url::encode_segment;
use crate::DEFAULT_API_VERSION;

/// Base URL of one hosted database:
/// `https://{host}/fmi/data/{version}/databases/{database}`.
///
/// `host` may carry its own scheme (`http://127.0.0.1:8080`), which is
/// kept as-is; a bare host name gets `https://`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    database: String,
    base_url: String,
}

impl Endpoint {
    /// Build the endpoint for `database` on `host`.
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Result<Self> {
        Self::with_version(host, database, DEFAULT_API_VERSION)
    }

    /// Build the endpoint with an explicit API version segment (e.g. `v1`).
    pub fn with_version(
        host: impl Into<String>,
        database: impl Into<String>,
        version: &str,
    ) -> Result<Self> {
        let host = host.into().trim().trim_end_matches('/').to_string();
        let database = database.into();

        if host.is_empty() {
            return Err(Error::new(ErrorKind::Config("host is empty".to_string())));
        }
        if database.is_empty() {
            return Err(Error::new(ErrorKind::Config("database is empty".to_string())));
        }

        let origin = if host.starts_with("http://") || host.starts_with("https://") {
            host.clone()
        } else {
            format!("https://{}", host)
        };

        let parsed = url::Url::parse(&origin)?;
        if parsed.host_str().is_none() {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "no host in '{}'",
                origin
            ))));
        }

        let base_url = format!(
            "{}/fmi/data/{}/databases/{}",
            origin,
            version,
            encode_segment(&database)
        );

        Ok(Self {
            host,
            database,
            base_url,
        })
    }

    /// Host as configured.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Database name as configured (unencoded).
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The database base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a database-relative path such as `/layouts/Bands/records`.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
