//! Transaction wire types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::Method;

/// Server-side status of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    InProgress,
    Done,
    Error,
    /// A status this client does not know; treated as still running
    Unknown(String),
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Done | TransactionStatus::Error)
    }
}

impl From<String> for TransactionStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "IN_PROGRESS" => TransactionStatus::InProgress,
            "DONE" => TransactionStatus::Done,
            "ERROR" => TransactionStatus::Error,
            _ => TransactionStatus::Unknown(raw),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::InProgress => f.write_str("IN_PROGRESS"),
            TransactionStatus::Done => f.write_str("DONE"),
            TransactionStatus::Error => f.write_str("ERROR"),
            TransactionStatus::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Kind of work a transaction tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Onboarding,
    Sync,
    Deletion,
    UserGroupProvisioning,
    Other(String),
}

impl From<String> for TransactionType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ONBOARDING" => TransactionType::Onboarding,
            "SYNC" => TransactionType::Sync,
            "DELETION" => TransactionType::Deletion,
            "USER_GROUP_PROVISIONING" => TransactionType::UserGroupProvisioning,
            _ => TransactionType::Other(raw),
        }
    }
}

impl From<TransactionType> for String {
    fn from(kind: TransactionType) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Onboarding => f.write_str("ONBOARDING"),
            TransactionType::Sync => f.write_str("SYNC"),
            TransactionType::Deletion => f.write_str("DELETION"),
            TransactionType::UserGroupProvisioning => f.write_str("USER_GROUP_PROVISIONING"),
            TransactionType::Other(raw) => f.write_str(raw),
        }
    }
}

/// Snapshot of a server-tracked asynchronous operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_uid: String,
    pub tenant_uid: String,
    pub entity_uid: String,
    pub entity_url: String,
    /// Where to ask for the next snapshot
    pub polling_url: String,
    pub submission_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Transaction {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Request that starts a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl TransactionRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A transaction that ended in ERROR
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{transaction_type} transaction for entity {entity_uid} failed: {message}")]
pub struct TransactionError {
    pub message: String,
    pub transaction_type: TransactionType,
    pub entity_uid: String,
}

impl TransactionError {
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            message: transaction
                .error_message
                .clone()
                .unwrap_or_else(|| "no error message reported".to_string()),
            transaction_type: transaction.transaction_type.clone(),
            entity_uid: transaction.entity_uid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "transactionUid": "tx-1",
        "tenantUid": "tenant-1",
        "entityUid": "entity-1",
        "entityUrl": "https://example.com/entities/entity-1",
        "pollingUrl": "https://example.com/api/rest/v1/transactions/tx-1",
        "submissionTime": "2024-05-01T10:00:00Z",
        "lastUpdatedTime": "2024-05-01T10:00:05Z",
        "type": "USER_GROUP_PROVISIONING",
        "status": "in_progress"
    }"#;

    #[test]
    fn test_deserialize_wire_shape() {
        let transaction: Transaction = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(transaction.transaction_uid, "tx-1");
        assert_eq!(transaction.status, TransactionStatus::InProgress);
        assert_eq!(
            transaction.transaction_type,
            TransactionType::UserGroupProvisioning
        );
        assert!(transaction.error_message.is_none());
        assert!(!transaction.is_terminal());
    }

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!(TransactionStatus::from("Done".to_string()), TransactionStatus::Done);
        assert_eq!(TransactionStatus::from("error".to_string()), TransactionStatus::Error);
        assert_eq!(
            TransactionStatus::from("PENDING_APPROVAL".to_string()),
            TransactionStatus::Unknown("PENDING_APPROVAL".to_string())
        );
        assert!(!TransactionStatus::Unknown("PENDING_APPROVAL".to_string()).is_terminal());
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let kind = TransactionType::from("FIRMWARE_UPGRADE".to_string());
        assert_eq!(kind.to_string(), "FIRMWARE_UPGRADE");
    }

    #[test]
    fn test_error_names_the_entity() {
        let raw = SAMPLE.replace("in_progress", "ERROR");
        let mut transaction: Transaction = serde_json::from_str(&raw).unwrap();
        transaction.error_message = Some("quota exceeded".to_string());

        let err = TransactionError::from_transaction(&transaction);
        assert_eq!(err.message, "quota exceeded");
        assert_eq!(err.entity_uid, "entity-1");
        assert_eq!(
            err.to_string(),
            "USER_GROUP_PROVISIONING transaction for entity entity-1 failed: quota exceeded"
        );
    }
}
