use std::sync::Arc;

use fmdata::records::ApiErrorKind;
use fmdata::MemoryCredentialStore;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer};

use crate::common::{cached_store, client, error, mount_login, ok, DB};

#[tokio::test]
async fn scenario_b_get_records_with_cached_token() {
    let server = MockServer::start().await;
    mount_login(&server, "unused", 0).await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/layouts/Bands/records")))
        .and(query_param("_offset", "1"))
        .and(query_param("_limit", "10"))
        .and(header("Authorization", "Bearer cached"))
        .respond_with(ok(json!({"data": [{"fieldData": {"bandName": "Sudie"}}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, cached_store("cached"));
    let found = client.get_records("Bands", 1, 10).await.unwrap();

    let rows: Vec<Value> = found
        .field_data()
        .into_iter()
        .map(|fields| Value::Object(fields.clone()))
        .collect();
    assert_eq!(rows, vec![json!({"bandName": "Sudie"})]);
}

#[tokio::test]
async fn scenario_c_invalid_token_invalidates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/layouts/Bands/records")))
        .respond_with(error(401, "952", "Invalid FileMaker Data API token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, cached_store("stale"));
    assert!(client.sessions().is_active());

    let err = client.get_records("Bands", 1, 10).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Domain);
    assert_eq!(err.code, "952");
    assert!(err.is_invalid_token());
    assert!(!client.sessions().is_active());
}

#[tokio::test]
async fn rejected_token_is_never_reused() {
    let server = MockServer::start().await;
    mount_login(&server, "fresh", 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/validateSession")))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(error(401, "952", "Invalid FileMaker Data API token"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/validateSession")))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, cached_store("stale"));

    // The failing call reports the error; it does not retry.
    assert!(client.validate_session().await.unwrap_err().is_invalid_token());
    // The next one refreshes first.
    client.validate_session().await.unwrap();
}

#[tokio::test]
async fn scenario_e_delete_missing_record() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DB}/layouts/Bands/records/42")))
        .respond_with(error(500, "101", "Record is missing"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, cached_store("cached"));
    let err = client.delete_record("Bands", 42).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Domain);
    assert_eq!(err.code, "101");
    assert_eq!(err.message, "Record is missing");
    assert!(err.is_record_missing());
    assert!(client.sessions().is_active());
}

#[tokio::test]
async fn created_fields_read_back_unchanged() {
    let server = MockServer::start().await;
    mount_login(&server, "tok", 1).await;

    let fields = json!({"bandName": "Sudie", "founded": 2012, "rating": 4.5, "active": true});

    Mock::given(method("POST"))
        .and(path(format!("{DB}/layouts/Bands/records")))
        .and(body_json(json!({ "fieldData": fields })))
        .respond_with(ok(json!({"recordId": "9", "modId": "0"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{DB}/layouts/Bands/records/9")))
        .respond_with(ok(json!({
            "data": [{"fieldData": fields, "portalData": {}, "recordId": "9", "modId": "0"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryCredentialStore::new()));
    let field_map: Map<String, Value> = fields.as_object().cloned().unwrap();

    let ids = client.create_record("Bands", field_map.clone()).await.unwrap();
    let record = client.get_record("Bands", &ids.record_id).await.unwrap();

    assert_eq!(record.field_data, field_map);
    assert_eq!(record.get::<f64>("rating"), Some(4.5));
}

#[tokio::test]
async fn find_with_no_match_is_domain_error_and_keeps_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{DB}/layouts/Bands/_find")))
        .respond_with(error(500, "401", "No records match the request"))
        .mount(&server)
        .await;

    let client = client(&server, cached_store("cached"));
    let err = client
        .find_raw("Bands", json!({"query": [{"bandName": "Nobody"}]}))
        .await
        .unwrap_err();

    assert!(err.is_no_records_match());
    assert!(client.sessions().is_active());
}
