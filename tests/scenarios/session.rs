use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use fmdata::auth::{
    CredentialStore, Credentials, FileCredentialStore, SessionConfig, SessionManager,
    SessionState, StoredSession,
};
use fmdata::client::ClientConfig;
use fmdata::records::ApiErrorKind;
use fmdata::{MemoryCredentialStore, RecordsClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{cached_store, client, credentials, error, mount_login, ok, DB};

#[tokio::test]
async fn scenario_a_refresh_populates_session() {
    let server = MockServer::start().await;
    mount_login(&server, "abc", 1).await;

    let store = Arc::new(MemoryCredentialStore::new());
    let sessions = SessionManager::new(credentials(&server), store.clone()).unwrap();
    assert_eq!(sessions.state(), SessionState::Unauthenticated);

    let before = Utc::now();
    let token = sessions.refresh().await.unwrap();
    let after = Utc::now();

    assert_eq!(token, "abc");
    assert!(sessions.is_active());

    // now + 900s, where "now" is taken before the request goes out.
    let expires_at = sessions.expires_at().unwrap();
    assert!(expires_at >= before + Duration::seconds(900));
    assert!(expires_at <= after + Duration::seconds(900));

    // Written through to the store.
    let stored = store.load_session().unwrap().unwrap();
    assert_eq!(stored.token, "abc");
    assert_eq!(stored.expires_at, expires_at);
}

#[tokio::test]
async fn scenario_d_concurrent_requests_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(ok(json!({"token": "shared"})).set_delay(StdDuration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/layouts/Bands/records")))
        .respond_with(ok(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryCredentialStore::new()));

    let (a, b) = tokio::join!(
        client.get_records("Bands", 1, 10),
        client.get_records("Bands", 1, 10),
    );
    a.unwrap();
    b.unwrap();

    let logins = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("/sessions"))
        .count();
    assert_eq!(logins, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_on_many_threads_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(ok(json!({"token": "shared"})).set_delay(StdDuration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let sessions =
        SessionManager::new(credentials(&server), Arc::new(MemoryCredentialStore::new()))
            .unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let sessions = sessions.clone();
            tokio::spawn(async move { sessions.get_valid_token().await })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        assert_eq!(task.unwrap().unwrap(), "shared");
    }
}

#[tokio::test]
async fn cancelled_caller_does_not_cancel_shared_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(ok(json!({"token": "survivor"})).set_delay(StdDuration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let sessions =
        SessionManager::new(credentials(&server), Arc::new(MemoryCredentialStore::new()))
            .unwrap();

    // Give up on the first caller while its refresh is still in flight.
    let impatient = tokio::time::timeout(StdDuration::from_millis(50), sessions.get_valid_token());
    assert!(impatient.await.is_err());

    assert_eq!(sessions.get_valid_token().await.unwrap(), "survivor");
}

#[tokio::test]
async fn revoke_then_next_call_refreshes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(ok(json!({"token": "tok"})))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DB}/sessions/tok")))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sessions =
        SessionManager::new(credentials(&server), Arc::new(MemoryCredentialStore::new()))
            .unwrap();

    sessions.get_valid_token().await.unwrap();
    sessions.revoke().await.unwrap();
    assert!(!sessions.is_active());

    sessions.get_valid_token().await.unwrap();
    assert!(sessions.is_active());
}

#[tokio::test]
async fn unconfirmed_revoke_keeps_session() {
    let server = MockServer::start().await;
    mount_login(&server, "tok", 1).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DB}/sessions/tok")))
        .respond_with(error(500, "952", "Invalid FileMaker Data API token (*)"))
        .mount(&server)
        .await;

    let sessions =
        SessionManager::new(credentials(&server), Arc::new(MemoryCredentialStore::new()))
            .unwrap();
    sessions.get_valid_token().await.unwrap();

    let err = sessions.revoke().await.unwrap_err();
    assert_eq!(err.code(), Some("952"));
    assert!(sessions.is_active());
}

#[tokio::test]
async fn persisted_session_survives_restart() {
    let server = MockServer::start().await;
    mount_login(&server, "persisted", 1).await;

    let dir = tempfile::TempDir::new().unwrap();
    let store = || -> Arc<dyn CredentialStore> {
        Arc::new(FileCredentialStore::in_dir(dir.path(), "music"))
    };

    let first = SessionManager::new(credentials(&server), store()).unwrap();
    assert_eq!(first.get_valid_token().await.unwrap(), "persisted");
    drop(first);

    // A new process: no login, same token.
    let second = SessionManager::new(credentials(&server), store()).unwrap();
    assert!(second.is_active());
    assert_eq!(second.get_valid_token().await.unwrap(), "persisted");
}

#[tokio::test]
async fn failed_login_surfaces_code_and_leaves_session_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(error(
            401,
            "212",
            "Invalid user account and/or password; please try again",
        ))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryCredentialStore::new()));

    let err = client.get_records("Bands", 1, 10).await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(err.code, "212");
    assert_eq!(client.sessions().state(), SessionState::Unauthenticated);
}

/// Credentials pointing at a local port nothing listens on.
fn closed_port_credentials() -> Credentials {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Credentials::from_user_password(
        format!("http://127.0.0.1:{port}"),
        "Music",
        "admin",
        "secret",
    )
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = ClientConfig::builder()
        .with_timeout(StdDuration::from_secs(2))
        .build();
    let sessions = SessionManager::with_config(
        closed_port_credentials(),
        Arc::new(MemoryCredentialStore::new()),
        SessionConfig::default(),
        config,
    )
    .unwrap();

    let err = sessions.get_valid_token().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_kind_to_records_callers() {
    // With a cached token the record call itself hits the closed port.
    let client = RecordsClient::new(closed_port_credentials(), cached_store("cached")).unwrap();

    let err = client.get_records("Bands", 1, 10).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Transport, "unexpected error: {err:?}");
    assert!(err.is_transport());
    assert!(client.sessions().is_active());
}

#[tokio::test]
async fn persisted_session_is_not_shared_between_accounts() {
    let server = MockServer::start().await;
    mount_login(&server, "admin-token", 0).await;

    let dir = tempfile::TempDir::new().unwrap();
    let admin = credentials(&server);
    let guest = Credentials::from_user_password(server.uri(), "Music", "guest", "guest");

    FileCredentialStore::in_dir(dir.path(), &admin.store_key())
        .save_session(&StoredSession {
            token: "admin-token".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        })
        .unwrap();

    let guest_store = Arc::new(FileCredentialStore::in_dir(dir.path(), &guest.store_key()));
    let sessions = SessionManager::new(guest, guest_store).unwrap();

    assert_eq!(sessions.state(), SessionState::Unauthenticated);

    let admin_store = Arc::new(FileCredentialStore::in_dir(dir.path(), &admin.store_key()));
    let sessions = SessionManager::new(admin, admin_store).unwrap();
    assert_eq!(sessions.get_valid_token().await.unwrap(), "admin-token");
}

#[tokio::test]
async fn slow_server_times_out_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/sessions")))
        .respond_with(ResponseTemplate::new(200).set_delay(StdDuration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .with_timeout(StdDuration::from_millis(200))
        .build();
    let sessions = SessionManager::with_config(
        credentials(&server),
        Arc::new(MemoryCredentialStore::new()),
        SessionConfig::default(),
        config,
    )
    .unwrap();

    let err = sessions.get_valid_token().await.unwrap_err();
    assert!(err.is_transport());
}
