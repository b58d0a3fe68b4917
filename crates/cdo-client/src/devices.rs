//! Device workflows
//!
//! Onboarding and credential rotation both run server-side state machines.
//! The client pushes the request and then polls the device (or its
//! device-specific configuration) until the state machine settles.

use cdo_core::retry::RetryPolicy;
use cdo_core::state::{
    ConfigStateInterpreter, DeviceOnboardingInterpreter, DeviceSnapshot, StateInterpreter,
};
use cdo_core::WorkflowError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{executor, CdoClient};

/// State sent to ask the device to pick up new credentials
const UPDATE_CREDENTIALS_STATE: &str = "WAIT_FOR_USER_TO_UPDATE_CREDS";

pub fn device_path(uid: &str) -> String {
    format!("/aegis/rest/v1/services/targets/devices/{}", uid)
}

pub fn specific_config_path(specific_uid: &str) -> String {
    format!("/aegis/rest/v1/services/asa/configs/{}", specific_uid)
}

/// A managed device as the service reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub connectivity_state: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_machine_details: Option<StateMachineDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMachineDetails {
    #[serde(default)]
    pub last_error: Option<StateMachineError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMachineError {
    pub error_message: String,
}

impl Device {
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            state: self.state.clone(),
            status: self.status.clone(),
            connectivity_state: self.connectivity_state,
            error_detail: self
                .state_machine_details
                .as_ref()
                .and_then(|details| details.last_error.as_ref())
                .map(|err| err.error_message.clone()),
        }
    }
}

/// Device-specific configuration, polled during credential rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificDevice {
    pub uid: String,
    pub state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsUpdate<'a> {
    state: &'a str,
    credentials: &'a str,
}

pub async fn read(client: &CdoClient, uid: &str) -> Result<Device, WorkflowError> {
    Ok(client.get(&device_path(uid)).await?)
}

/// Poll a device until onboarding finishes
///
/// Fails fast on ERROR, on credential states, and when the device finished
/// but is unreachable. A missing device is an error.
pub async fn wait_until_onboarded(
    client: &CdoClient,
    uid: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Device, WorkflowError> {
    let device = executor(policy, cancel)
        .execute(|| probe_onboarding(client, uid))
        .await?;

    info!(uid, name = ?device.name, "Device onboarded");
    Ok(device)
}

async fn probe_onboarding(client: &CdoClient, uid: &str) -> Result<Option<Device>, WorkflowError> {
    let device = read(client, uid).await?;
    let decision = DeviceOnboardingInterpreter.classify(&device.snapshot());
    Ok(decision.into_probe(device)?)
}

/// Push new credentials to a device and wait until they are applied
///
/// `credentials` is sent as-is; preparing (encrypting) it is the caller's job.
pub async fn rotate_credentials(
    client: &CdoClient,
    specific_uid: &str,
    credentials: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<SpecificDevice, WorkflowError> {
    let path = specific_config_path(specific_uid);
    let update = CredentialsUpdate {
        state: UPDATE_CREDENTIALS_STATE,
        credentials,
    };

    client.put(&path, &update).await?;
    info!(specific_uid, "Submitted new credentials");

    let config = executor(policy, cancel)
        .execute(|| probe_config(client, &path))
        .await?;

    info!(specific_uid, "Credentials applied");
    Ok(config)
}

async fn probe_config(
    client: &CdoClient,
    path: &str,
) -> Result<Option<SpecificDevice>, WorkflowError> {
    let config: SpecificDevice = client.get(path).await?;
    let decision = ConfigStateInterpreter.classify(config.state.as_str());
    Ok(decision.into_probe(config)?)
}
