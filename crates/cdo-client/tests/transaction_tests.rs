//! Transaction tracking against a mock service
//!
//! Tests cover:
//! - Polling a transaction to DONE
//! - Failing at trigger time without polling
//! - Failing while polling
//! - User-group provisioning end to end

mod common;

use cdo_client::user_groups::{self, UserGroup, USER_GROUPS_PATH};
use cdo_core::transaction::{TransactionRequest, TransactionStatus, TransactionTracker};
use cdo_core::WorkflowError;
use common::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_trigger(server: &MockServer, status: &str, error: Option<&str>) {
    Mock::given(method("POST"))
        .and(path(USER_GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_json(
            server, status, error,
        )))
        .mount(server)
        .await;
}

fn groups() -> Vec<UserGroup> {
    vec![UserGroup {
        group_identifier: "grp-1".to_string(),
        issuer_url: "https://idp.example.com".to_string(),
        name: "net-admins".to_string(),
        role: "ROLE_ADMIN".to_string(),
        notes: Some("provisioned by test".to_string()),
    }]
}

#[tokio::test]
async fn test_transaction_polled_until_done() {
    let server = MockServer::start().await;
    mount_trigger(&server, "IN_PROGRESS", None).await;
    mount_sequence(
        &server,
        &transaction_path(),
        vec![
            transaction_json(&server, "IN_PROGRESS", None),
            transaction_json(&server, "IN_PROGRESS", None),
            transaction_json(&server, "DONE", None),
        ],
    )
    .await;

    let client = client_for(&server);
    let tracker = TransactionTracker::new(&client);
    let request = TransactionRequest::post(USER_GROUPS_PATH, json!([]));

    let finished = tracker
        .trigger_and_wait(&request, &fast_policy())
        .await
        .unwrap();

    assert_eq!(finished.status, TransactionStatus::Done);
    assert_eq!(request_count(&server, "GET", &transaction_path()).await, 3);
}

#[tokio::test]
async fn test_error_at_trigger_is_not_polled() {
    let server = MockServer::start().await;
    mount_trigger(&server, "ERROR", Some("quota exceeded")).await;
    Mock::given(method("GET"))
        .and(path(transaction_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tracker = TransactionTracker::new(&client);
    let request = TransactionRequest::post(USER_GROUPS_PATH, json!([]));

    let err = tracker
        .trigger_and_wait(&request, &fast_policy())
        .await
        .unwrap_err();

    let failed = err.as_transaction_error().expect("transaction error");
    assert_eq!(failed.message, "quota exceeded");
    assert_eq!(failed.entity_uid, ENTITY_UID);
    assert!(err.to_string().contains(ENTITY_UID));
}

#[tokio::test]
async fn test_error_while_polling() {
    let server = MockServer::start().await;
    mount_trigger(&server, "IN_PROGRESS", None).await;
    mount_sequence(
        &server,
        &transaction_path(),
        vec![
            transaction_json(&server, "IN_PROGRESS", None),
            transaction_json(&server, "ERROR", Some("group already exists")),
        ],
    )
    .await;

    let client = client_for(&server);
    let request = TransactionRequest::post(USER_GROUPS_PATH, json!([]));

    let err = TransactionTracker::new(&client)
        .trigger_and_wait(&request, &fast_policy())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Transaction(_)));
    assert!(err.to_string().contains("group already exists"));
    assert_eq!(request_count(&server, "GET", &transaction_path()).await, 2);
}

#[tokio::test]
async fn test_trigger_http_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(USER_GROUPS_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = TransactionRequest::post(USER_GROUPS_PATH, json!([]));

    let err = TransactionTracker::new(&client)
        .trigger_transaction(&request)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("403"));
    assert!(err.to_string().contains("forbidden"));
}

#[tokio::test]
async fn test_provision_user_groups() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(USER_GROUPS_PATH))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_partial_json(json!([{ "groupIdentifier": "grp-1" }])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(transaction_json(&server, "IN_PROGRESS", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_sequence(
        &server,
        &transaction_path(),
        vec![transaction_json(&server, "DONE", None)],
    )
    .await;

    let client = client_for(&server);
    let transaction = user_groups::provision(
        &client,
        &groups(),
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(transaction.status, TransactionStatus::Done);
    assert_eq!(transaction.entity_uid, ENTITY_UID);
}

#[tokio::test]
async fn test_provision_gives_up_after_retry_limit() {
    let server = MockServer::start().await;
    mount_trigger(&server, "IN_PROGRESS", None).await;
    mount_sequence(
        &server,
        &transaction_path(),
        vec![transaction_json(&server, "IN_PROGRESS", None)],
    )
    .await;

    let client = client_for(&server);
    let err = user_groups::provision(
        &client,
        &groups(),
        &limited_policy(2),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(request_count(&server, "GET", &transaction_path()).await, 3);
}
