//! # fmdata-client
//!
//! Request plumbing for the FileMaker Data API.
//!
//! This crate provides the pieces every Data API call shares:
//! - A [`Transport`] seam with a reqwest-backed [`HttpTransport`]
//! - Endpoint resolution against `https://{host}/fmi/data/vLatest/databases/{database}`
//! - [`OperationDescriptor`], the uniform description of one API call
//! - The [`Envelope`] decoder for the `{response, messages}` wrapper
//! - [`DataApiClient`], which sends a descriptor and checks the envelope code
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Callers                                  │
//! │  (fmdata-auth session manager, fmdata-records dispatcher)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DataApiClient                             │
//! │  - Resolves descriptor paths against the database endpoint  │
//! │  - Attaches Basic/Bearer authorization + JSON body          │
//! │  - Decodes the envelope, maps non-zero codes to errors      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport (HttpTransport)                │
//! │  - One HTTP exchange: (status, body) or a transport error   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fmdata_client::{Authorization, DataApiClient, Endpoint, OperationDescriptor};
//!
//! let client = DataApiClient::new(Endpoint::new("fms.example.com", "Music")?)?;
//! let envelope = client
//!     .send(
//!         &OperationDescriptor::get("/layouts/Bands/records").with_query("_limit", "10"),
//!         &Authorization::Bearer(token),
//!     )
//!     .await?;
//! ```

mod client;
mod config;
mod endpoint;
mod envelope;
mod error;
mod operation;
mod request;
mod response;
pub mod security;
mod transport;

pub use client::DataApiClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::Endpoint;
pub use envelope::{DecodeError, Envelope, Message, ProjectionError, SUCCESS_CODE};
pub use error::{Error, ErrorKind, Result};
pub use operation::{AuthScheme, OperationDescriptor};
pub use request::{Authorization, HttpRequest, RequestMethod};
pub use response::HttpResponse;
pub use transport::{HttpTransport, Transport};

/// Data API version segment used in every path.
pub const DEFAULT_API_VERSION: &str = "vLatest";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("fmdata/", env!("CARGO_PKG_VERSION"));
