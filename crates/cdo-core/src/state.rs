//! Remote state interpretation
//!
//! The service reports progress of long-running workflows as free-form state
//! strings. Interpreters turn a snapshot of those strings into a control
//! decision for the retry loop. Unknown states always map to `Continue` so a
//! new server-side state never breaks an older client, while known failure
//! states end the loop on the first observation.

use std::fmt;

use thiserror::Error;

/// Canonical terminal state names (compared case-insensitively)
pub mod names {
    pub const DONE: &str = "DONE";
    pub const ERROR: &str = "ERROR";
    pub const BAD_CREDENTIALS: &str = "BAD_CREDENTIALS";
    pub const WAIT_FOR_USER_TO_UPDATE_CREDS: &str = "WAIT_FOR_USER_TO_UPDATE_CREDS";
    pub const IDLE: &str = "IDLE";
    pub const ACTIVE: &str = "ACTIVE";
    pub const FAILED: &str = "FAILED";
}

/// A remote resource state string, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    Done,
    Error,
    BadCredentials,
    WaitForUserToUpdateCreds,
    /// Anything else, kept verbatim
    Intermediate(String),
}

impl RemoteState {
    /// Classify a raw state string, ignoring ASCII case
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(names::DONE) {
            RemoteState::Done
        } else if raw.eq_ignore_ascii_case(names::ERROR) {
            RemoteState::Error
        } else if raw.eq_ignore_ascii_case(names::BAD_CREDENTIALS) {
            RemoteState::BadCredentials
        } else if raw.eq_ignore_ascii_case(names::WAIT_FOR_USER_TO_UPDATE_CREDS) {
            RemoteState::WaitForUserToUpdateCreds
        } else {
            RemoteState::Intermediate(raw.to_string())
        }
    }

    /// Whether the workflow needs new credentials before it can go on
    pub fn needs_credentials(&self) -> bool {
        matches!(
            self,
            RemoteState::BadCredentials | RemoteState::WaitForUserToUpdateCreds
        )
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteState::Done => f.write_str(names::DONE),
            RemoteState::Error => f.write_str(names::ERROR),
            RemoteState::BadCredentials => f.write_str(names::BAD_CREDENTIALS),
            RemoteState::WaitForUserToUpdateCreds => {
                f.write_str(names::WAIT_FOR_USER_TO_UPDATE_CREDS)
            }
            RemoteState::Intermediate(raw) => f.write_str(raw),
        }
    }
}

/// Control decision derived from a remote snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Still working; poll again
    Continue,
    /// Reached the desired terminal state
    Success,
    /// Reached a terminal failure state
    Fatal(String),
    /// Blocked until the user supplies new credentials
    CredentialsNeeded(String),
}

impl Classification {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Classification::Continue)
    }

    /// Map to a probe result: `Continue` polls again, `Success` yields
    /// `value`, the failure variants become a [`StateError`].
    pub fn into_probe<T>(self, value: T) -> Result<Option<T>, StateError> {
        match self {
            Classification::Continue => Ok(None),
            Classification::Success => Ok(Some(value)),
            Classification::Fatal(reason) => Err(StateError::Fatal { reason }),
            Classification::CredentialsNeeded(reason) => {
                Err(StateError::CredentialsNeeded { reason })
            }
        }
    }
}

/// Terminal failure classifications, never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("{reason}")]
    Fatal { reason: String },

    #[error("credentials needed: {reason}")]
    CredentialsNeeded { reason: String },
}

/// Pure classifier from a snapshot of a remote resource to a decision
pub trait StateInterpreter {
    type Snapshot: ?Sized;

    fn classify(&self, snapshot: &Self::Snapshot) -> Classification;
}

/// Device fields relevant to onboarding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceSnapshot {
    /// Workflow state, e.g. `DONE`, `ERROR`, `PRE_READ_METADATA`
    pub state: String,
    /// Activity status, e.g. `IDLE`, `SYNCING`
    pub status: String,
    /// Positive when the service can reach the device
    pub connectivity_state: i32,
    /// Error detail reported alongside an `ERROR` state
    pub error_detail: Option<String>,
}

/// Decides when device onboarding is complete
///
/// | condition | result |
/// |---|---|
/// | state DONE, status IDLE, connectivity > 0 | Success |
/// | state DONE, status IDLE, connectivity ≤ 0 | Fatal |
/// | state ERROR | Fatal |
/// | state BAD_CREDENTIALS or WAIT_FOR_USER_TO_UPDATE_CREDS | CredentialsNeeded |
/// | anything else | Continue |
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceOnboardingInterpreter;

impl StateInterpreter for DeviceOnboardingInterpreter {
    type Snapshot = DeviceSnapshot;

    fn classify(&self, snapshot: &DeviceSnapshot) -> Classification {
        let state = RemoteState::parse(&snapshot.state);
        match &state {
            RemoteState::Done if snapshot.status.trim().eq_ignore_ascii_case(names::IDLE) => {
                if snapshot.connectivity_state > 0 {
                    Classification::Success
                } else {
                    Classification::Fatal(format!(
                        "connectivity error: device is not reachable (connectivity state {})",
                        snapshot.connectivity_state
                    ))
                }
            }
            RemoteState::Error => Classification::Fatal(
                snapshot
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "device workflow ended in ERROR state".to_string()),
            ),
            credentials if credentials.needs_credentials() => {
                Classification::CredentialsNeeded(snapshot.error_detail.clone().unwrap_or_else(
                    || format!("device is in {} state", credentials),
                ))
            }
            _ => Classification::Continue,
        }
    }
}

/// Decides when a device-specific configuration has settled
///
/// Used after pushing new credentials. DONE is success and ERROR is fatal.
/// BAD_CREDENTIALS means the new credentials were rejected.
/// WAIT_FOR_USER_TO_UPDATE_CREDS is the state the update itself requests, so
/// it only means the update has not been picked up yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigStateInterpreter;

impl StateInterpreter for ConfigStateInterpreter {
    type Snapshot = str;

    fn classify(&self, snapshot: &str) -> Classification {
        match RemoteState::parse(snapshot) {
            RemoteState::Done => Classification::Success,
            RemoteState::Error => {
                Classification::Fatal("configuration workflow ended in ERROR state".to_string())
            }
            RemoteState::BadCredentials => Classification::CredentialsNeeded(
                "the device rejected the new credentials".to_string(),
            ),
            _ => Classification::Continue,
        }
    }
}

/// Decides when a secure device connector has come up
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectorStateInterpreter;

impl StateInterpreter for ConnectorStateInterpreter {
    type Snapshot = str;

    fn classify(&self, snapshot: &str) -> Classification {
        let status = snapshot.trim();
        if status.eq_ignore_ascii_case(names::ACTIVE) {
            Classification::Success
        } else if status.eq_ignore_ascii_case(names::ERROR)
            || status.eq_ignore_ascii_case(names::FAILED)
        {
            Classification::Fatal(format!("connector reported {} status", status))
        } else {
            Classification::Continue
        }
    }
}
