use std::sync::Arc;

use chrono::{Duration, Utc};
use fmdata::{Credentials, MemoryCredentialStore, RecordsClient};
use fmdata::auth::{CredentialStore, StoredSession};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Database prefix every Data API path hangs off.
pub const DB: &str = "/fmi/data/vLatest/databases/Music";

/// Basic-auth secret for `admin:secret`.
pub const SECRET: &str = "YWRtaW46c2VjcmV0";

/// A success envelope around `response`.
pub fn ok(response: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "response": response,
        "messages": [{"code": "0", "message": "OK"}]
    }))
}

/// An error envelope with the given HTTP status.
pub fn error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "response": {},
        "messages": [{"code": code, "message": message}]
    }))
}

/// Mount `POST /sessions` answering with `token`, expected `times` times.
pub async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .and(header("Authorization", format!("Basic {SECRET}").as_str()))
        .respond_with(ok(json!({ "token": token })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn credentials(server: &MockServer) -> Credentials {
    Credentials::from_user_password(server.uri(), "Music", "admin", "secret")
}

/// A store already holding a session that is good for ten more minutes.
pub fn cached_store(token: &str) -> Arc<dyn CredentialStore> {
    Arc::new(MemoryCredentialStore::with_session(StoredSession {
        token: token.to_string(),
        expires_at: Utc::now() + Duration::minutes(10),
    }))
}

pub fn client(server: &MockServer, store: Arc<dyn CredentialStore>) -> RecordsClient {
    RecordsClient::new(credentials(server), store).expect("client")
}
