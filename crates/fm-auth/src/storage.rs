//! Durable storage for the session cache.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// A persisted `{token, expiresAt}` pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Trait for session cache storage.
///
/// Only the session manager writes through this interface.
pub trait CredentialStore: Send + Sync + 'static {
    /// Load the cached session, if any.
    fn load_session(&self) -> Result<Option<StoredSession>>;

    /// Replace the cached session.
    fn save_session(&self, session: &StoredSession) -> Result<()>;

    /// Remove the cached session.
    fn clear_session(&self) -> Result<()>;
}

/// In-process store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a session.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_session(&self) -> Result<Option<StoredSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_session(&self, session: &StoredSession) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// File-based store: one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store for `key` under the default directory.
    ///
    /// Default directory: `~/.fmdata/sessions/`
    pub fn new(key: &str) -> Result<Self> {
        Ok(Self::in_dir(default_session_dir()?, key))
    }

    /// Create a store for `key` under a custom directory.
    pub fn in_dir(dir: impl AsRef<Path>, key: &str) -> Self {
        // Sanitize the key to create a safe filename
        let safe_key = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();

        Self {
            path: dir.as_ref().join(format!("{}.json", safe_key)),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_session(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        let stored: StoredSession = serde_json::from_str(&json)?;

        Ok(Some(stored))
    }

    fn save_session(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Get the default session storage directory.
pub fn default_session_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::new(ErrorKind::Config("Could not find home directory".to_string())))?;

    Ok(home.join(".fmdata").join("sessions"))
}
