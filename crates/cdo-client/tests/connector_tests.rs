//! Connector workflows against a mock service
//!
//! Tests cover:
//! - NotFound meaning success for deletion and failure for reads
//! - Waiting for a connector to become active
//! - Response status and decode error mapping

mod common;

use cdo_client::connectors::{self, connector_path};
use cdo_core::api::ApiError;
use cdo_core::WorkflowError;
use common::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONNECTOR_UID: &str = "sdc-5005";

fn connector_json(status: &str) -> serde_json::Value {
    json!({ "uid": CONNECTOR_UID, "name": "branch-sdc", "status": status })
}

#[tokio::test]
async fn test_delete_waits_for_not_found() {
    let server = MockServer::start().await;
    let route = connector_path(CONNECTOR_UID);

    Mock::given(method("DELETE"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_json("DELETING")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    connectors::delete(
        &client,
        CONNECTOR_UID,
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(request_count(&server, "GET", &route).await, 3);
}

#[tokio::test]
async fn test_delete_of_missing_connector_succeeds() {
    let server = MockServer::start().await;
    let route = connector_path(CONNECTOR_UID);

    Mock::given(method("DELETE"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = connectors::delete(
        &client,
        CONNECTOR_UID,
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_read_of_missing_connector_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(connector_path(CONNECTOR_UID)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = connectors::read(&client, CONNECTOR_UID).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_deletion_gives_up_after_retry_limit() {
    let server = MockServer::start().await;
    let route = connector_path(CONNECTOR_UID);
    Mock::given(method("GET"))
        .and(path(route.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_json("DELETING")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = connectors::wait_until_deleted(
        &client,
        CONNECTOR_UID,
        &limited_policy(3),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(request_count(&server, "GET", &route).await, 4);
}

#[tokio::test]
async fn test_wait_until_active() {
    let server = MockServer::start().await;
    let route = connector_path(CONNECTOR_UID);
    mount_sequence(
        &server,
        &route,
        vec![
            connector_json("REQUESTED"),
            connector_json("ONBOARDING"),
            connector_json("ACTIVE"),
        ],
    )
    .await;

    let client = client_for(&server);
    let connector = connectors::wait_until_active(
        &client,
        CONNECTOR_UID,
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(connector.status, "ACTIVE");
    assert_eq!(request_count(&server, "GET", &route).await, 3);
}

#[tokio::test]
async fn test_failed_connector_is_fatal() {
    let server = MockServer::start().await;
    mount_sequence(
        &server,
        &connector_path(CONNECTOR_UID),
        vec![connector_json("FAILED")],
    )
    .await;

    let client = client_for(&server);
    let err = connectors::wait_until_active(
        &client,
        CONNECTOR_UID,
        &fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, WorkflowError::State(_)));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(connector_path(CONNECTOR_UID)))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = connectors::read(&client, CONNECTOR_UID).await.unwrap_err();

    assert_eq!(err, ApiError::status(500, "backend unavailable"));
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(connector_path(CONNECTOR_UID)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = connectors::read(&client, CONNECTOR_UID).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}
