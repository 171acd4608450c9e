//! Static connection credentials.
//!
//! The basic-auth secret is redacted in Debug output.

use base64::Engine;
use sha2::{Digest, Sha256};

use fmdata_client::{Authorization, Endpoint};

use crate::error::{Error, ErrorKind, Result};

/// Host, database and basic-auth secret for one hosted database.
///
/// Immutable for the life of the process. The secret is the base64
/// encoding of `user:password`, exactly as it goes into the
/// `Authorization: Basic` header when a session is created.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    host: String,
    database: String,
    basic_auth_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("basic_auth_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from an already encoded basic-auth secret.
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        basic_auth_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            basic_auth_secret: basic_auth_secret.into(),
        }
    }

    /// Create credentials from an account name and password.
    pub fn from_user_password(
        host: impl Into<String>,
        database: impl Into<String>,
        username: &str,
        password: &str,
    ) -> Self {
        let secret = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        Self::new(host, database, secret)
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `FM_HOST`
    /// - `FM_DATABASE`
    /// - either `FM_AUTH` (base64 `user:password`) or both `FM_USERNAME` and `FM_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("FM_HOST")
            .map_err(|_| Error::new(ErrorKind::EnvVar("FM_HOST".to_string())))?;
        let database = std::env::var("FM_DATABASE")
            .map_err(|_| Error::new(ErrorKind::EnvVar("FM_DATABASE".to_string())))?;

        if let Ok(secret) = std::env::var("FM_AUTH") {
            return Ok(Self::new(host, database, secret));
        }

        let username = std::env::var("FM_USERNAME")
            .map_err(|_| Error::new(ErrorKind::EnvVar("FM_AUTH or FM_USERNAME".to_string())))?;
        let password = std::env::var("FM_PASSWORD")
            .map_err(|_| Error::new(ErrorKind::EnvVar("FM_PASSWORD".to_string())))?;

        Ok(Self::from_user_password(host, database, &username, &password))
    }

    /// Host name, optionally with scheme and port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns true if all three parts are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.host.is_empty() && !self.database.is_empty() && !self.basic_auth_secret.is_empty()
    }

    /// Resolve the database endpoint.
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::new(self.host.clone(), self.database.clone()).map_err(Into::into)
    }

    /// The credential used to create sessions.
    pub fn basic_authorization(&self) -> Authorization {
        Authorization::Basic(self.basic_auth_secret.clone())
    }

    /// Key under which this account's session is persisted.
    ///
    /// Sessions belong to an account, not just a database, so the key ends
    /// with a short SHA-256 digest of the secret. The secret itself never
    /// reaches the file name.
    pub fn store_key(&self) -> String {
        let digest = Sha256::digest(self.basic_auth_secret.as_bytes());
        let account: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}_{}_{}", self.host, self.database, account)
    }
}
