//! Transaction tracking
//!
//! Triggers server-side transactions and polls them to a terminal status
//! through the retry engine.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::lifecycle::{LifecycleEvent, TransactionLifecycle};
use super::types::{Transaction, TransactionError, TransactionRequest, TransactionStatus};
use crate::api::ApiError;
use crate::retry::{RetryExecutorBuilder, RetryPolicy, TracingObserver};
use crate::state::{Classification, StateInterpreter};
use crate::workflow::WorkflowError;

/// Issues transaction requests on behalf of the tracker
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Send the request that starts a transaction
    async fn trigger(&self, request: &TransactionRequest) -> Result<Transaction, ApiError>;

    /// Fetch the latest snapshot from a transaction's polling URL
    async fn fetch(&self, polling_url: &str) -> Result<Transaction, ApiError>;
}

#[async_trait]
impl<T: TransactionApi + ?Sized> TransactionApi for Arc<T> {
    async fn trigger(&self, request: &TransactionRequest) -> Result<Transaction, ApiError> {
        (**self).trigger(request).await
    }

    async fn fetch(&self, polling_url: &str) -> Result<Transaction, ApiError> {
        (**self).fetch(polling_url).await
    }
}

#[async_trait]
impl<T: TransactionApi + ?Sized> TransactionApi for &T {
    async fn trigger(&self, request: &TransactionRequest) -> Result<Transaction, ApiError> {
        (**self).trigger(request).await
    }

    async fn fetch(&self, polling_url: &str) -> Result<Transaction, ApiError> {
        (**self).fetch(polling_url).await
    }
}

/// Classifies transaction snapshots: DONE succeeds, ERROR is fatal,
/// IN_PROGRESS and unknown statuses keep polling
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionInterpreter;

impl TransactionInterpreter {
    /// Probe result for a snapshot, keeping a failed transaction's details
    pub fn resolve(&self, transaction: Transaction) -> Result<Option<Transaction>, TransactionError> {
        match transaction.status {
            TransactionStatus::Done => Ok(Some(transaction)),
            TransactionStatus::Error => Err(TransactionError::from_transaction(&transaction)),
            TransactionStatus::InProgress | TransactionStatus::Unknown(_) => Ok(None),
        }
    }
}

impl StateInterpreter for TransactionInterpreter {
    type Snapshot = Transaction;

    fn classify(&self, snapshot: &Transaction) -> Classification {
        match self.resolve(snapshot.clone()) {
            Ok(Some(_)) => Classification::Success,
            Ok(None) => Classification::Continue,
            Err(failed) => Classification::Fatal(failed.to_string()),
        }
    }
}

/// Triggers transactions and waits for them to finish
pub struct TransactionTracker<A> {
    api: A,
    cancellation: Option<CancellationToken>,
}

impl<A: TransactionApi> TransactionTracker<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cancellation: None,
        }
    }

    /// Abandon waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Send the triggering request
    ///
    /// A transaction that comes back already in ERROR is reported as a
    /// [`TransactionError`] without any polling.
    pub async fn trigger_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, WorkflowError> {
        tracing::debug!(method = %request.method, path = %request.path, "Triggering transaction");

        let transaction = self.api.trigger(request).await?;

        if transaction.status == TransactionStatus::Error {
            let failed = TransactionError::from_transaction(&transaction);
            tracing::warn!(
                transaction_uid = %transaction.transaction_uid,
                entity_uid = %transaction.entity_uid,
                error = %failed.message,
                "Transaction failed when triggered"
            );
            return Err(failed.into());
        }

        tracing::info!(
            transaction_uid = %transaction.transaction_uid,
            transaction_type = %transaction.transaction_type,
            entity_uid = %transaction.entity_uid,
            lifecycle = %TransactionLifecycle::Triggered,
            "Transaction triggered"
        );
        Ok(transaction)
    }

    /// Poll `transaction` until it is DONE or ERROR
    ///
    /// Returns at once, without polling, when the transaction is already
    /// terminal.
    pub async fn wait_for_transaction_to_finish(
        &self,
        transaction: Transaction,
        policy: &RetryPolicy,
    ) -> Result<Transaction, WorkflowError> {
        let polling = Self::transition(
            &transaction,
            TransactionLifecycle::Triggered,
            &LifecycleEvent::Observed(transaction.status.clone()),
        );

        let result = match transaction.status {
            TransactionStatus::Done => Ok(transaction.clone()),
            TransactionStatus::Error => Err(TransactionError::from_transaction(&transaction).into()),
            _ => self.poll(&transaction, policy).await,
        };

        match Self::outcome_event(&result) {
            Some(event) => {
                let subject = result.as_ref().unwrap_or(&transaction);
                Self::transition(subject, polling, &event);
            }
            None => {
                if let Err(err) = &result {
                    tracing::warn!(
                        transaction_uid = %transaction.transaction_uid,
                        lifecycle = %polling,
                        error = %err,
                        "Stopped waiting for transaction"
                    );
                }
            }
        }

        result
    }

    /// Trigger a transaction and wait for it to finish
    pub async fn trigger_and_wait(
        &self,
        request: &TransactionRequest,
        policy: &RetryPolicy,
    ) -> Result<Transaction, WorkflowError> {
        let transaction = self.trigger_transaction(request).await?;
        self.wait_for_transaction_to_finish(transaction, policy).await
    }

    async fn poll(
        &self,
        transaction: &Transaction,
        policy: &RetryPolicy,
    ) -> Result<Transaction, WorkflowError> {
        let mut builder = RetryExecutorBuilder::new()
            .with_policy(policy.clone())
            .with_observer(TracingObserver::new(policy.message()));
        if let Some(token) = &self.cancellation {
            builder = builder.with_cancellation(token.clone());
        }
        let executor = builder.build();

        let api = &self.api;
        let polling_url = transaction.polling_url.as_str();

        Ok(executor
            .execute(|| Self::poll_once(api, polling_url))
            .await?)
    }

    /// One probe of the polling loop
    async fn poll_once(
        api: &A,
        polling_url: &str,
    ) -> Result<Option<Transaction>, WorkflowError> {
        let latest = api.fetch(polling_url).await?;
        tracing::debug!(
            transaction_uid = %latest.transaction_uid,
            status = %latest.status,
            "Polled transaction"
        );

        Ok(TransactionInterpreter.resolve(latest)?)
    }

    /// Lifecycle event that ends a wait, if the outcome moves the lifecycle
    ///
    /// Transport and decode failures leave the lifecycle where it was.
    fn outcome_event(result: &Result<Transaction, WorkflowError>) -> Option<LifecycleEvent> {
        match result {
            Ok(finished) => Some(LifecycleEvent::Observed(finished.status.clone())),
            Err(WorkflowError::Transaction(_)) => {
                Some(LifecycleEvent::Observed(TransactionStatus::Error))
            }
            Err(err) if err.is_timeout() || err.is_exhausted() || err.is_cancelled() => {
                Some(LifecycleEvent::GaveUp)
            }
            Err(_) => None,
        }
    }

    fn transition(
        transaction: &Transaction,
        from: TransactionLifecycle,
        event: &LifecycleEvent,
    ) -> TransactionLifecycle {
        let to = from.advance(event);
        if to != from {
            tracing::info!(
                transaction_uid = %transaction.transaction_uid,
                transaction_type = %transaction.transaction_type,
                entity_uid = %transaction.entity_uid,
                from = %from,
                to = %to,
                "Transaction lifecycle changed"
            );
        }
        to
    }
}
