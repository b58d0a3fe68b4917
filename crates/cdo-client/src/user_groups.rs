//! Bulk user-group provisioning
//!
//! Provisioning runs as a server-side transaction: one POST creates every
//! group and returns a transaction that is then tracked to completion.

use cdo_core::retry::RetryPolicy;
use cdo_core::transaction::{Transaction, TransactionRequest, TransactionTracker};
use cdo_core::WorkflowError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::CdoClient;

pub const USER_GROUPS_PATH: &str = "/api/rest/v1/users/groups";

/// An identity-provider group mapped to a role in the tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub group_identifier: String,
    pub issuer_url: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request that provisions `groups` in one transaction
pub fn provision_request(groups: &[UserGroup]) -> Result<TransactionRequest, WorkflowError> {
    let body = serde_json::to_value(groups)
        .map_err(|e| cdo_core::ApiError::Decode(e.to_string()))?;
    Ok(TransactionRequest::post(USER_GROUPS_PATH, body))
}

/// Create `groups` and wait for the provisioning transaction to finish
pub async fn provision(
    client: &CdoClient,
    groups: &[UserGroup],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Transaction, WorkflowError> {
    let request = provision_request(groups)?;
    let tracker = TransactionTracker::new(client).with_cancellation(cancel.clone());

    let transaction = tracker.trigger_and_wait(&request, policy).await?;
    info!(
        groups = groups.len(),
        transaction_uid = %transaction.transaction_uid,
        "User groups provisioned"
    );
    Ok(transaction)
}
