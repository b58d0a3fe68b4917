//! Common test infrastructure for cdo-client tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::time::Duration;

use cdo_client::{CdoClient, ClientConfig};
use cdo_core::retry::RetryPolicy;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const TRANSACTION_UID: &str = "tx-1001";
pub const ENTITY_UID: &str = "entity-2002";

pub fn transaction_path() -> String {
    format!("/api/rest/v1/transactions/{}", TRANSACTION_UID)
}

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> CdoClient {
    CdoClient::new(ClientConfig::new(server.uri()).with_token(TOKEN)).unwrap()
}

/// Short delays so real-time tests finish quickly
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .message("test wait")
        .retries(-1)
        .delay(Duration::from_millis(10))
        .timeout(Duration::from_secs(10))
        .early_exit_on_error(true)
        .build()
        .unwrap()
}

pub fn limited_policy(retries: i64) -> RetryPolicy {
    RetryPolicy::builder()
        .retries(retries)
        .delay(Duration::from_millis(10))
        .early_exit_on_error(true)
        .build()
        .unwrap()
}

/// Transaction body whose polling URL points back at the mock server
pub fn transaction_json(server: &MockServer, status: &str, error: Option<&str>) -> Value {
    let mut body = json!({
        "transactionUid": TRANSACTION_UID,
        "tenantUid": "tenant-1",
        "entityUid": ENTITY_UID,
        "entityUrl": format!("{}/api/rest/v1/users/groups", server.uri()),
        "pollingUrl": format!("{}{}", server.uri(), transaction_path()),
        "submissionTime": "2024-05-01T10:00:00Z",
        "lastUpdatedTime": "2024-05-01T10:00:01Z",
        "type": "USER_GROUP_PROVISIONING",
        "status": status,
    });
    if let Some(error) = error {
        body["errorMessage"] = json!(error);
    }
    body
}

pub fn device_json(uid: &str, state: &str, status: &str, connectivity: i32) -> Value {
    json!({
        "uid": uid,
        "name": "edge-fw-01",
        "state": state,
        "status": status,
        "connectivityState": connectivity,
    })
}

/// Respond to GET `route` with each body in turn; the last one repeats
pub async fn mount_sequence(server: &MockServer, route: &str, bodies: Vec<Value>) {
    let last = bodies.len().saturating_sub(1);
    for (i, body) in bodies.into_iter().enumerate() {
        let mock = Mock::given(method("GET"))
            .and(path(route.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        if i < last {
            mock.up_to_n_times(1).mount(server).await;
        } else {
            mock.mount(server).await;
        }
    }
}

/// Number of requests the server saw for `method` and `route`
pub async fn request_count(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == verb && request.url.path() == route)
        .count()
}
