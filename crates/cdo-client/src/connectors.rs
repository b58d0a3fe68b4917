//! Secure device connector workflows

use cdo_core::api::{ApiError, OnNotFound};
use cdo_core::retry::RetryPolicy;
use cdo_core::state::{ConnectorStateInterpreter, StateInterpreter};
use cdo_core::WorkflowError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{executor, CdoClient};

pub fn connector_path(uid: &str) -> String {
    format!("/aegis/rest/v1/services/targets/proxies/{}", uid)
}

/// A secure device connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Read a connector; a missing connector is [`ApiError::NotFound`]
pub async fn read(client: &CdoClient, uid: &str) -> Result<Connector, ApiError> {
    client.get(&connector_path(uid)).await
}

/// Delete a connector and wait until the service stops reporting it
///
/// A connector that is already gone counts as deleted.
pub async fn delete(
    client: &CdoClient,
    uid: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<(), WorkflowError> {
    OnNotFound::Success.resolve(client.delete(&connector_path(uid)).await)?;
    info!(uid, "Requested connector deletion");

    wait_until_deleted(client, uid, policy, cancel).await
}

/// Poll until reading the connector answers 404
pub async fn wait_until_deleted(
    client: &CdoClient,
    uid: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<(), WorkflowError> {
    executor(policy, cancel)
        .execute(|| probe_deleted(client, uid))
        .await?;

    info!(uid, "Connector deleted");
    Ok(())
}

async fn probe_deleted(client: &CdoClient, uid: &str) -> Result<Option<()>, WorkflowError> {
    match OnNotFound::Success.resolve(read(client, uid).await)? {
        None => Ok(Some(())),
        Some(_) => Ok(None),
    }
}

/// Poll until the connector reports ACTIVE
pub async fn wait_until_active(
    client: &CdoClient,
    uid: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Connector, WorkflowError> {
    let connector = executor(policy, cancel)
        .execute(|| probe_active(client, uid))
        .await?;

    info!(uid, "Connector active");
    Ok(connector)
}

async fn probe_active(client: &CdoClient, uid: &str) -> Result<Option<Connector>, WorkflowError> {
    let connector = read(client, uid).await?;
    let decision = ConnectorStateInterpreter.classify(connector.status.as_str());
    Ok(decision.into_probe(connector)?)
}
