//! Retry/poll execution engine with policy-based configuration
//!
//! Drives a caller-supplied probe until the remote operation it checks is
//! done. Every loop terminates under at least one of three bounds: the retry
//! limit, the policy timeout, or a caller's cancellation token.
//!
//! # Features
//!
//! - Immutable, validated `RetryPolicy` (rejects policies with no bound)
//! - Early exit on the first probe error for terminal classifications
//! - Probes and inter-attempt delays both race the deadline and cancellation
//! - Observable attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//!
//! # Example
//!
//! ```rust,no_run
//! use cdo_core::retry::{retry, RetryError, RetryPolicy};
//! use std::time::Duration;
//!
//! async fn example() -> Result<(), RetryError<String>> {
//!     let policy = RetryPolicy::builder()
//!         .retries(10)
//!         .delay(Duration::from_secs(2))
//!         .build()
//!         .expect("bounded policy");
//!
//!     retry(&policy, || async {
//!         // Ok(Some(..)) when done, Ok(None) to poll again
//!         Ok(Some(()))
//!     })
//!     .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod policy;

pub use error::RetryError;
pub use executor::{retry, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use policy::{RetryPolicy, RetryPolicyBuilder, UNLIMITED_RETRIES};
