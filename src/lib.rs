//! # fmdata
//!
//! A FileMaker Data API client library for Rust.
//!
//! The hard part of talking to the Data API is the session token: it is
//! obtained with basic auth, expires 15 minutes after last use, and must be
//! refreshed exactly once no matter how many requests are waiting on it.
//! This library handles that under every record operation.
//!
//! ## Security
//!
//! - Tokens and basic-auth secrets are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages built from server bodies are sanitized
//!
//! ## Crates
//!
//! - **fmdata-client** - Transport, endpoint resolution, envelope decoding
//! - **fmdata-auth** - Credentials, credential stores, session manager
//! - **fmdata-records** - Request dispatcher, record CRUD, find, globals
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fmdata::{FindRequest, RecordsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // FM_HOST, FM_DATABASE, FM_USERNAME, FM_PASSWORD
//!     let client = RecordsClient::from_env()?;
//!
//!     let bands = client
//!         .find("Bands", &FindRequest::new().where_field("city", "Nashville"))
//!         .await?;
//!
//!     for band in &bands.records {
//!         println!("{}", serde_json::Value::Object(band.field_data.clone()));
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use fmdata_auth as auth;
#[cfg(feature = "client")]
pub use fmdata_client as client;
#[cfg(feature = "records")]
pub use fmdata_records as records;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use fmdata_auth::{Credentials, FileCredentialStore, MemoryCredentialStore, SessionManager};
#[cfg(feature = "client")]
pub use fmdata_client::ClientConfig;
#[cfg(feature = "records")]
pub use fmdata_records::{ApiError, FindRequest, RecordsClient};
