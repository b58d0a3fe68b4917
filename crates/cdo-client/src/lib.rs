//! # cdo-client
//!
//! HTTP client for the device-management service and the long-running
//! workflows built on it:
//! - Device onboarding and credential rotation ([`devices`])
//! - Secure device connector lifecycle ([`connectors`])
//! - Bulk user-group provisioning ([`user_groups`])
//!
//! Every workflow polls through the `cdo_core` retry engine under a caller
//! supplied policy and cancellation token.

pub mod client;
pub mod connectors;
pub mod devices;
pub mod error;
pub mod user_groups;

pub use client::{CdoClient, ClientConfig};
pub use error::ClientError;

use cdo_core::retry::{RetryExecutor, RetryExecutorBuilder, RetryPolicy, TracingObserver};
use tokio_util::sync::CancellationToken;

/// Executor that logs through `tracing` and stops on `cancel`
pub(crate) fn executor(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> RetryExecutor<TracingObserver> {
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .with_observer(TracingObserver::new(policy.message()))
        .with_cancellation(cancel.clone())
        .build()
}
