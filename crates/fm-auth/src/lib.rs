//! # fmdata-auth
//!
//! Session management for the FileMaker Data API.
//!
//! A Data API session is a short-lived bearer token obtained by posting
//! basic-auth credentials to `/sessions`. The server keeps it alive for
//! 15 minutes after its last use. [`SessionManager`] owns that token:
//!
//! - hands out the cached token while it is comfortably inside its lifetime
//! - refreshes it when missing or near expiry, with at most one refresh in
//!   flight no matter how many callers are waiting
//! - revokes it on the server and clears it locally
//! - drops it when the server reports it invalid
//! - writes it through to a [`CredentialStore`] so a restart can reuse it
//!
//! ## Security
//!
//! - The basic-auth secret and tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - The file store writes with mode `0600`
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fmdata_auth::{Credentials, FileCredentialStore, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fmdata_auth::Error> {
//!     let credentials = Credentials::from_env()?;
//!     let store = FileCredentialStore::new(&credentials.store_key())?;
//!     let sessions = SessionManager::new(credentials, Arc::new(store))?;
//!
//!     let token = sessions.get_valid_token().await?;
//!     // ... use the token ...
//!     sessions.revoke().await?;
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod session;
mod storage;

pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Result};
pub use session::{
    SessionConfig, SessionManager, SessionState, DEFAULT_SAFETY_MARGIN_SECS,
    DEFAULT_TOKEN_LIFETIME_SECS,
};
pub use storage::{
    default_session_dir, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    StoredSession,
};

/// Envelope code the server returns for an unknown or expired token.
pub const INVALID_TOKEN_CODE: &str = "952";
