//! FileMaker Data API records client.
//!
//! Each method builds one [`OperationDescriptor`] and hands it to the
//! [`Dispatcher`] together with a projection of the success envelope.

use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::instrument;

use fmdata_auth::{CredentialStore, Credentials, FileCredentialStore, SessionManager};
use fmdata_client::security::url::encode_segment;
use fmdata_client::{Envelope, HttpTransport, OperationDescriptor, ProjectionError, Transport};

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::find::FindRequest;
use crate::types::{DataInfo, FoundSet, Record, RecordIds};

/// FileMaker Data API records client.
///
/// Provides typed methods for the record surface of one database:
/// - Create, read, edit, duplicate and delete single records
/// - List records with paging
/// - Find with AND/OR/omit criteria
/// - Set global fields
/// - Validate the current session
///
/// # Example
///
/// ```rust,ignore
/// use fmdata_records::{FindRequest, RecordsClient};
///
/// let client = RecordsClient::from_env()?;
///
/// let bands = client
///     .find("Bands", &FindRequest::new().where_field("city", "Nashville"))
///     .await?;
///
/// for band in &bands.records {
///     println!("{:?}", band.field("bandName"));
/// }
/// ```
pub struct RecordsClient<T: Transport = HttpTransport> {
    dispatcher: Dispatcher<T>,
}

impl<T: Transport> Clone for RecordsClient<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for RecordsClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordsClient")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl RecordsClient<HttpTransport> {
    /// Create a client with the default HTTP transport.
    pub fn new(credentials: Credentials, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self::from_sessions(SessionManager::new(credentials, store)?))
    }

    /// Create a client from `FM_*` environment variables, persisting the
    /// session under `~/.fmdata/sessions/`.
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let store = FileCredentialStore::new(&credentials.store_key())?;
        Self::new(credentials, Arc::new(store))
    }
}

impl<T: Transport> RecordsClient<T> {
    /// Create a client over an existing session manager.
    pub fn from_sessions(sessions: SessionManager<T>) -> Self {
        Self {
            dispatcher: Dispatcher::new(sessions),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &SessionManager<T> {
        self.dispatcher.sessions()
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Create a record. An empty map creates an empty record.
    #[instrument(skip(self, field_data))]
    pub async fn create_record(
        &self,
        layout: &str,
        field_data: Map<String, Value>,
    ) -> Result<RecordIds> {
        let descriptor = OperationDescriptor::post(records_path(layout))
            .with_payload(json!({ "fieldData": field_data }));
        self.dispatcher.execute(descriptor, project_response).await
    }

    /// Fetch one page of records. `offset` is 1-based.
    #[instrument(skip(self))]
    pub async fn get_records(&self, layout: &str, offset: u32, limit: u32) -> Result<FoundSet> {
        let descriptor = OperationDescriptor::get(records_path(layout))
            .with_query("_offset", offset)
            .with_query("_limit", limit);
        self.dispatcher.execute(descriptor, project_found_set).await
    }

    /// Run a find built with [`FindRequest`].
    ///
    /// No match is a [`Domain`](crate::ApiErrorKind::Domain) error with
    /// code `"401"`; see [`ApiError::is_no_records_match`](crate::ApiError::is_no_records_match).
    pub async fn find(&self, layout: &str, request: &FindRequest) -> Result<FoundSet> {
        self.find_raw(layout, request.to_payload()).await
    }

    /// Run a find with a caller-built body.
    #[instrument(skip(self, payload))]
    pub async fn find_raw(&self, layout: &str, payload: Value) -> Result<FoundSet> {
        let descriptor =
            OperationDescriptor::post(format!("/layouts/{}/_find", encode_segment(layout)))
                .with_payload(payload);
        self.dispatcher.execute(descriptor, project_found_set).await
    }

    /// Fetch one record by id.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn get_record(&self, layout: &str, id: impl Display) -> Result<Record> {
        let descriptor = OperationDescriptor::get(record_path(layout, &id));
        self.dispatcher
            .execute(descriptor, |envelope| {
                envelope
                    .project::<Vec<Record>>("data")?
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProjectionError::InvalidField {
                        field: "data".to_string(),
                        reason: "no record returned".to_string(),
                    })
            })
            .await
    }

    /// Delete one record.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn delete_record(&self, layout: &str, id: impl Display) -> Result<()> {
        let descriptor = OperationDescriptor::delete(record_path(layout, &id));
        self.dispatcher.execute(descriptor, |_| Ok(())).await
    }

    /// Edit fields of one record and return its new `modId`.
    ///
    /// With `mod_id` set the server refuses the edit if the record changed
    /// since that modification; without it the last writer wins.
    #[instrument(skip(self, id, field_data), fields(id = %id))]
    pub async fn edit_record(
        &self,
        layout: &str,
        id: impl Display,
        field_data: Map<String, Value>,
        mod_id: Option<&str>,
    ) -> Result<Option<String>> {
        let mut payload = json!({ "fieldData": field_data });
        if let (Some(mod_id), Some(body)) = (mod_id, payload.as_object_mut()) {
            body.insert("modId".to_string(), json!(mod_id));
        }

        let descriptor = OperationDescriptor::patch(record_path(layout, &id)).with_payload(payload);
        self.dispatcher
            .execute(descriptor, |envelope| envelope.project_optional("modId"))
            .await
    }

    /// Duplicate one record; returns the copy's ids.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn duplicate_record(&self, layout: &str, id: impl Display) -> Result<RecordIds> {
        let descriptor = OperationDescriptor::post(record_path(layout, &id));
        self.dispatcher.execute(descriptor, project_response).await
    }

    // =========================================================================
    // Session-scoped Operations
    // =========================================================================

    /// Set global fields for the current session.
    ///
    /// Keys are fully qualified (`Table::Field`).
    #[instrument(skip(self, global_fields))]
    pub async fn set_global_fields(&self, global_fields: Map<String, Value>) -> Result<()> {
        let descriptor = OperationDescriptor::patch("/globals")
            .with_payload(json!({ "globalFields": global_fields }));
        self.dispatcher.execute(descriptor, |_| Ok(())).await
    }

    /// Ask the server whether the current token is still valid.
    #[instrument(skip(self))]
    pub async fn validate_session(&self) -> Result<()> {
        self.dispatcher
            .execute(OperationDescriptor::get("/validateSession"), |_| Ok(()))
            .await
    }

    /// Revoke the session on the server.
    pub async fn logout(&self) -> Result<()> {
        self.sessions().revoke().await.map_err(Into::into)
    }
}

fn records_path(layout: &str) -> String {
    format!("/layouts/{}/records", encode_segment(layout))
}

fn record_path(layout: &str, id: &impl Display) -> String {
    format!(
        "/layouts/{}/records/{}",
        encode_segment(layout),
        encode_segment(&id.to_string())
    )
}

/// Deserialize the whole `response` object.
fn project_response<R: DeserializeOwned>(
    envelope: &Envelope,
) -> std::result::Result<R, ProjectionError> {
    let response = envelope
        .response()
        .cloned()
        .ok_or_else(|| ProjectionError::MissingField("response".to_string()))?;

    serde_json::from_value(Value::Object(response)).map_err(|e| ProjectionError::InvalidField {
        field: "response".to_string(),
        reason: e.to_string(),
    })
}

fn project_found_set(envelope: &Envelope) -> std::result::Result<FoundSet, ProjectionError> {
    Ok(FoundSet {
        records: envelope.project("data")?,
        data_info: envelope.project_optional::<DataInfo>("dataInfo")?,
    })
}
