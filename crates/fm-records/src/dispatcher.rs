//! Uniform execution of one [`OperationDescriptor`].
//!
//! ```text
//! token (if required) → build request → send → decode → check code → project
//! ```
//!
//! The dispatcher never retries. The one side effect it has on session
//! state is asking the [`SessionManager`] to forget a token the server has
//! just rejected, so the next caller refreshes instead of reusing it.

use tracing::{debug, instrument, warn};

use fmdata_auth::{SessionManager, INVALID_TOKEN_CODE};
use fmdata_client::{
    AuthScheme, Authorization, Envelope, HttpTransport, OperationDescriptor, ProjectionError,
    Transport,
};

use crate::error::{ApiError, Result};

/// HTTP status the server uses for requests it will not authorize.
const UNAUTHORIZED_STATUS: u16 = 401;

/// Executes descriptors with session tokens from a [`SessionManager`].
///
/// Clone is cheap; clones share the session.
pub struct Dispatcher<T: Transport = HttpTransport> {
    sessions: SessionManager<T>,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(sessions: SessionManager<T>) -> Self {
        Self { sessions }
    }

    /// The session manager supplying tokens.
    pub fn sessions(&self) -> &SessionManager<T> {
        &self.sessions
    }

    /// Execute `descriptor` and project the successful envelope.
    ///
    /// The envelope code is checked before `project` runs: a non-zero code
    /// is a [`Domain`](crate::ApiErrorKind::Domain) error even if the
    /// response also carries data. If the code says the token is invalid,
    /// the session is invalidated before the error is returned.
    #[instrument(skip(self, descriptor, project), fields(method = %descriptor.method, path = %descriptor.path))]
    pub async fn execute<R, F>(&self, descriptor: OperationDescriptor, project: F) -> Result<R>
    where
        F: FnOnce(&Envelope) -> std::result::Result<R, ProjectionError>,
    {
        let auth = match descriptor.auth {
            AuthScheme::Bearer => Authorization::Bearer(self.sessions.get_valid_token().await?),
            AuthScheme::Basic => self.sessions.credentials().basic_authorization(),
            AuthScheme::None => Authorization::None,
        };

        let envelope = match self.sessions.client().send(&descriptor, &auth).await {
            Ok(envelope) => envelope,
            Err(err) => {
                if let Authorization::Bearer(token) = &auth {
                    if signals_invalid_token(&err) {
                        warn!(code = err.code(), "Server rejected session token");
                        self.sessions.invalidate(token);
                    }
                }
                return Err(err.into());
            }
        };

        debug!("Request succeeded");
        project(&envelope).map_err(ApiError::from)
    }
}

fn signals_invalid_token(err: &fmdata_client::Error) -> bool {
    match &err.kind {
        fmdata_client::ErrorKind::Domain { status, code, .. } => {
            code == INVALID_TOKEN_CODE || *status == UNAUTHORIZED_STATUS
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmdata_auth::{Credentials, MemoryCredentialStore, SessionConfig, StoredSession};
    use fmdata_client::{DataApiClient, Endpoint, HttpRequest, HttpResponse, RequestMethod};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Answers `/sessions` with a fresh token and everything else with a
    /// scripted envelope; records every request.
    struct ScriptedServer {
        status: u16,
        body: serde_json::Value,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for ScriptedServer {
        async fn send(&self, request: HttpRequest) -> fmdata_client::Result<HttpResponse> {
            let is_login =
                request.method == RequestMethod::Post && request.url.ends_with("/sessions");
            self.seen.lock().unwrap().push(request);

            let (status, body) = if is_login {
                (
                    200,
                    json!({"response": {"token": "fresh"}, "messages": [{"code": "0", "message": "OK"}]}),
                )
            } else {
                (self.status, self.body.clone())
            };
            Ok(HttpResponse::new(status, serde_json::to_vec(&body).unwrap()))
        }
    }

    fn dispatcher(status: u16, body: serde_json::Value) -> Dispatcher<ScriptedServer> {
        let cached = StoredSession {
            token: "cached".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(10),
        };
        let client = DataApiClient::with_transport(
            Endpoint::new("fms.example.com", "Music").unwrap(),
            ScriptedServer {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            },
        );
        Dispatcher::new(SessionManager::with_client(
            client,
            Credentials::new("fms.example.com", "Music", "c2VjcmV0"),
            Arc::new(MemoryCredentialStore::with_session(cached)),
            SessionConfig::default(),
        ))
    }

    fn seen(dispatcher: &Dispatcher<ScriptedServer>) -> Vec<HttpRequest> {
        dispatcher
            .sessions()
            .client()
            .transport()
            .seen
            .lock()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_execute_uses_cached_token() {
        let dispatcher = dispatcher(
            200,
            json!({"response": {"data": [1, 2]}, "messages": [{"code": "0", "message": "OK"}]}),
        );

        let data: Vec<u32> = dispatcher
            .execute(OperationDescriptor::get("/layouts/Bands/records"), |env| {
                env.project("data")
            })
            .await
            .unwrap();

        assert_eq!(data, vec![1, 2]);
        let requests = seen(&dispatcher);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].header_value("Authorization"),
            Some("Bearer cached")
        );
    }

    #[tokio::test]
    async fn test_invalid_token_code_invalidates_session() {
        let dispatcher = dispatcher(
            401,
            json!({"response": {}, "messages": [{"code": "952", "message": "Invalid FileMaker Data API token (*)"}]}),
        );

        let err = dispatcher
            .execute(OperationDescriptor::get("/validateSession"), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(err.is_invalid_token());
        assert!(!dispatcher.sessions().is_active());

        // The next call refreshes instead of reusing the rejected token.
        let _ = dispatcher
            .execute(OperationDescriptor::get("/validateSession"), |_| Ok(()))
            .await;
        let requests = seen(&dispatcher);
        assert_eq!(requests.len(), 3);
        assert!(requests[1].url.ends_with("/sessions"));
        assert_eq!(
            requests[2].header_value("Authorization"),
            Some("Bearer fresh")
        );
    }

    #[tokio::test]
    async fn test_other_domain_error_keeps_session() {
        let dispatcher = dispatcher(
            500,
            json!({"response": {}, "messages": [{"code": "101", "message": "Record is missing"}]}),
        );

        let err = dispatcher
            .execute(OperationDescriptor::delete("/layouts/Bands/records/42"), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(err.is_record_missing());
        assert_eq!(err.message, "Record is missing");
        assert!(dispatcher.sessions().is_active());
    }

    #[tokio::test]
    async fn test_code_is_checked_before_projection() {
        let dispatcher = dispatcher(
            500,
            json!({"response": {"data": [{"fieldData": {}}]}, "messages": [{"code": "401", "message": "No records match the request"}]}),
        );

        let mut projected = false;
        let err = dispatcher
            .execute(OperationDescriptor::post("/layouts/Bands/_find"), |_| {
                projected = true;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(err.is_no_records_match());
        assert!(!projected);
    }

    #[tokio::test]
    async fn test_projection_failure_is_protocol_error() {
        let dispatcher = dispatcher(
            200,
            json!({"response": {}, "messages": [{"code": "0", "message": "OK"}]}),
        );

        let err = dispatcher
            .execute(OperationDescriptor::post("/layouts/Bands/records"), |env| {
                env.project::<String>("recordId")
            })
            .await
            .unwrap_err();

        assert!(err.is_protocol());
        assert!(dispatcher.sessions().is_active());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_protocol_error() {
        let dispatcher = dispatcher(502, json!("<html>Bad Gateway</html>"));

        let err = dispatcher
            .execute(OperationDescriptor::get("/validateSession"), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(err.is_protocol());
        assert!(err.code.is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_descriptor_sends_no_token() {
        let dispatcher = dispatcher(
            200,
            json!({"response": {}, "messages": [{"code": "0", "message": "OK"}]}),
        );

        dispatcher
            .execute(
                OperationDescriptor::get("/productInfo").with_auth(AuthScheme::None),
                |_| Ok(()),
            )
            .await
            .unwrap();

        let requests = seen(&dispatcher);
        assert!(requests[0].header_value("Authorization").is_none());
    }

    #[test]
    fn test_signals_invalid_token() {
        let domain = |status, code: &str| {
            fmdata_client::Error::new(fmdata_client::ErrorKind::Domain {
                status,
                code: code.to_string(),
                message: String::new(),
            })
        };

        assert!(signals_invalid_token(&domain(401, "952")));
        assert!(signals_invalid_token(&domain(200, "952")));
        assert!(signals_invalid_token(&domain(401, "10")));
        assert!(!signals_invalid_token(&domain(500, "101")));
        assert!(!signals_invalid_token(&fmdata_client::Error::new(
            fmdata_client::ErrorKind::Timeout
        )));
    }
}
