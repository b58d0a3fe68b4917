//! Retry policy
//!
//! A `RetryPolicy` is immutable once built. Construction goes through
//! `RetryPolicyBuilder`, which rejects policies that could poll forever.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::RetryPolicyConfig;

/// Sentinel accepted by [`RetryPolicyBuilder::retries`] for "no attempt limit"
pub const UNLIMITED_RETRIES: i64 = -1;

const DEFAULT_MESSAGE: &str = "waiting for remote operation";
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(15 * 60);
const TRANSACTION_DELAY: Duration = Duration::from_secs(2);

/// Bounds and pacing for a retry loop
///
/// At least one of `max_retries` and `timeout` is always bounded. A probe
/// governed by a policy with `max_retries = Some(n)` is invoked at most
/// `n + 1` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    message: String,
    max_retries: Option<u32>,
    delay: Duration,
    timeout: Option<Duration>,
    early_exit_on_error: bool,
}

impl RetryPolicy {
    /// Start building a policy
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Policy used for polling transactions: no attempt limit, a 15 minute
    /// timeout, a 2 second delay and early exit on the first error.
    pub fn transaction_default() -> Self {
        Self {
            message: "waiting for transaction to finish".to_string(),
            max_retries: None,
            delay: TRANSACTION_DELAY,
            timeout: Some(TRANSACTION_TIMEOUT),
            early_exit_on_error: true,
        }
    }

    /// Progress message reported between attempts
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Maximum number of retries after the first attempt, `None` if unlimited
    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Maximum number of probe invocations, `None` if unlimited
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_retries.map(|r| r.saturating_add(1))
    }

    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wall-clock bound for the whole loop, `None` if unbounded
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the first probe error ends the loop
    pub fn early_exit_on_error(&self) -> bool {
        self.early_exit_on_error
    }

    /// Copy of this policy with a different progress message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Copy of this policy with early exit switched on or off
    pub fn with_early_exit_on_error(mut self, early_exit: bool) -> Self {
        self.early_exit_on_error = early_exit;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            max_retries: Some(DEFAULT_RETRIES),
            delay: DEFAULT_DELAY,
            timeout: None,
            early_exit_on_error: false,
        }
    }
}

impl TryFrom<&RetryPolicyConfig> for RetryPolicy {
    type Error = Error;

    fn try_from(config: &RetryPolicyConfig) -> Result<Self> {
        let mut builder = RetryPolicy::builder()
            .retries(config.retries)
            .delay(Duration::from_millis(config.delay_ms))
            .timeout(Duration::from_secs(config.timeout_secs))
            .early_exit_on_error(config.early_exit_on_error);

        if let Some(message) = &config.message {
            builder = builder.message(message.clone());
        }

        builder.build()
    }
}

/// Builder for [`RetryPolicy`]
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use cdo_core::retry::{RetryPolicy, UNLIMITED_RETRIES};
///
/// let policy = RetryPolicy::builder()
///     .message("waiting for device to onboard")
///     .retries(UNLIMITED_RETRIES)
///     .delay(Duration::from_secs(3))
///     .timeout(Duration::from_secs(600))
///     .early_exit_on_error(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.max_retries(), None);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    message: String,
    retries: i64,
    delay: Duration,
    timeout: Duration,
    early_exit_on_error: bool,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            retries: DEFAULT_RETRIES as i64,
            delay: DEFAULT_DELAY,
            timeout: Duration::ZERO,
            early_exit_on_error: false,
        }
    }
}

impl RetryPolicyBuilder {
    /// Set the progress message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the retry limit; [`UNLIMITED_RETRIES`] removes it
    pub fn retries(mut self, retries: i64) -> Self {
        self.retries = retries;
        self
    }

    /// Set the delay between attempts (zero polls without pausing)
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the overall timeout; zero means unbounded
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop on the first probe error instead of retrying it
    pub fn early_exit_on_error(mut self, early_exit: bool) -> Self {
        self.early_exit_on_error = early_exit;
        self
    }

    /// Validate and build the policy
    pub fn build(self) -> Result<RetryPolicy> {
        let max_retries = match self.retries {
            UNLIMITED_RETRIES => None,
            r if r < 0 => {
                return Err(Error::invalid_policy(format!(
                    "retries must be {} (unlimited) or non-negative, got {}",
                    UNLIMITED_RETRIES, r
                )))
            }
            r => Some(u32::try_from(r).map_err(|_| {
                Error::invalid_policy(format!("retries {} exceeds {}", r, u32::MAX))
            })?),
        };

        let timeout = (!self.timeout.is_zero()).then_some(self.timeout);

        if max_retries.is_none() && timeout.is_none() {
            return Err(Error::invalid_policy(format!(
                "'{}' has neither a retry limit nor a timeout",
                self.message
            )));
        }

        Ok(RetryPolicy {
            message: self.message,
            max_retries,
            delay: self.delay,
            timeout,
            early_exit_on_error: self.early_exit_on_error,
        })
    }
}
