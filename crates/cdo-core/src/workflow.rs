//! Workflow-level error type
//!
//! A workflow probe can fail at the transport, by classifying a terminal
//! remote state, or by observing a failed transaction. Loops that end without
//! a probe failure (exhausted, timed out, cancelled) keep their own kind.

use thiserror::Error;

use crate::api::ApiError;
use crate::retry::RetryError;
use crate::state::StateError;
use crate::transaction::TransactionError;

/// Outcome of a failed workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Retry(Box<RetryError<WorkflowError>>),
}

impl From<RetryError<WorkflowError>> for WorkflowError {
    /// Early exits surface as the probe error that caused them
    fn from(err: RetryError<WorkflowError>) -> Self {
        match err {
            RetryError::EarlyExit { source, .. } => source,
            other => WorkflowError::Retry(Box::new(other)),
        }
    }
}

impl WorkflowError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::Retry(err) if err.is_timeout())
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, WorkflowError::Retry(err) if err.is_exhausted())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Retry(err) if err.is_cancelled())
    }

    pub fn is_credentials_needed(&self) -> bool {
        matches!(
            self,
            WorkflowError::State(StateError::CredentialsNeeded { .. })
        )
    }

    /// The failed transaction, if that is what ended the workflow
    pub fn as_transaction_error(&self) -> Option<&TransactionError> {
        match self {
            WorkflowError::Transaction(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_early_exit_is_unwrapped() {
        let inner = WorkflowError::State(StateError::CredentialsNeeded {
            reason: "device is in BAD_CREDENTIALS state".to_string(),
        });
        let err: WorkflowError = RetryError::early_exit(2, inner).into();

        assert!(err.is_credentials_needed());
        assert_eq!(
            err.to_string(),
            "credentials needed: device is in BAD_CREDENTIALS state"
        );
    }

    #[test]
    fn test_timeout_keeps_its_kind() {
        let err: WorkflowError =
            RetryError::timeout(4, Duration::from_secs(10), None).into();

        assert!(err.is_timeout());
        assert!(!err.is_exhausted());
        assert!(err.to_string().starts_with("timed out"));
    }

    #[test]
    fn test_exhausted_wraps_last_transient_error() {
        let last = WorkflowError::Api(ApiError::status(503, "unavailable"));
        let err: WorkflowError =
            RetryError::exhausted(3, Some(last), Duration::from_secs(2)).into();

        assert!(err.is_exhausted());
        assert!(err.to_string().contains("503"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
