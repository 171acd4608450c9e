//! # fmdata-records
//!
//! Record operations for the FileMaker Data API.
//!
//! ## Features
//!
//! - **Dispatcher** - One execution path for every call: token, request,
//!   envelope check, projection. Invalid-token responses clear the session.
//! - **Records** - Create, get, edit (with optional `modId`), duplicate, delete
//! - **Lists** - Paged `getRecords` with `dataInfo` counts
//! - **Find** - [`FindRequest`] builder for AND/OR/omit queries, or raw JSON
//! - **Globals** - Set global fields for the session
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fmdata_auth::{Credentials, MemoryCredentialStore};
//! use fmdata_records::{FindRequest, RecordsClient};
//! use serde_json::{json, Map};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fmdata_records::ApiError> {
//!     let client = RecordsClient::new(
//!         Credentials::from_user_password("fms.example.com", "Music", "admin", "secret"),
//!         Arc::new(MemoryCredentialStore::new()),
//!     )?;
//!
//!     // Create
//!     let mut fields = Map::new();
//!     fields.insert("bandName".into(), json!("Sudie"));
//!     let ids = client.create_record("Bands", fields).await?;
//!
//!     // Find
//!     let found = client
//!         .find("Bands", &FindRequest::new().where_field("bandName", "Sudie"))
//!         .await?;
//!
//!     // Delete
//!     client.delete_record("Bands", &ids.record_id).await?;
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod dispatcher;
mod error;
mod find;
mod types;

pub use client::RecordsClient;
pub use dispatcher::Dispatcher;
pub use error::{
    ApiError, ApiErrorKind, Result, INVALID_TOKEN_CODE, NO_RECORDS_MATCH_CODE,
    RECORD_MISSING_CODE,
};
pub use find::{FindRequest, SortOrder};
pub use types::{DataInfo, FoundSet, Record, RecordIds};
