//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls how the client talks to the
//! service and how long each kind of workflow is allowed to poll.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Operation keys understood by `retry-policies.operations`
pub mod operations {
    pub const TRANSACTION: &str = "transaction";
    pub const DEVICE_ONBOARDING: &str = "device-onboarding";
    pub const CREDENTIAL_ROTATION: &str = "credential-rotation";
    pub const CONNECTOR_DELETION: &str = "connector-deletion";
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Service endpoint and HTTP settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,
}

/// Service endpoint and HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL of the service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.defenseorchestrator.com".to_string()
}
fn default_http_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!(
        "cdo/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Policy for operations without an entry of their own
    #[serde(default)]
    pub default: RetryPolicyConfig,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicyConfig>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut per_operation = HashMap::new();

        per_operation.insert(
            operations::TRANSACTION.to_string(),
            RetryPolicyConfig {
                message: Some("waiting for transaction to finish".to_string()),
                retries: -1,
                delay_ms: 2_000,
                timeout_secs: 900,
                early_exit_on_error: true,
            },
        );

        per_operation.insert(
            operations::DEVICE_ONBOARDING.to_string(),
            RetryPolicyConfig {
                message: Some("waiting for device to onboard".to_string()),
                retries: -1,
                delay_ms: 3_000,
                timeout_secs: 900,
                early_exit_on_error: true,
            },
        );

        per_operation.insert(
            operations::CREDENTIAL_ROTATION.to_string(),
            RetryPolicyConfig {
                message: Some("waiting for new credentials to apply".to_string()),
                retries: -1,
                delay_ms: 3_000,
                timeout_secs: 600,
                early_exit_on_error: true,
            },
        );

        per_operation.insert(
            operations::CONNECTOR_DELETION.to_string(),
            RetryPolicyConfig {
                message: Some("waiting for connector to be deleted".to_string()),
                retries: 60,
                delay_ms: 1_000,
                timeout_secs: 0,
                early_exit_on_error: true,
            },
        );

        Self {
            default: RetryPolicyConfig::default(),
            operations: per_operation,
        }
    }
}

impl RetryPoliciesConfig {
    /// Raw config for an operation, falling back to the default entry
    pub fn config_for(&self, operation: &str) -> &RetryPolicyConfig {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validated policy for an operation, falling back to the default entry
    pub fn policy_for(&self, operation: &str) -> Result<RetryPolicy> {
        RetryPolicy::try_from(self.config_for(operation))
    }

    /// Validated policy for an operation that must be configured explicitly
    pub fn policy(&self, operation: &str) -> Result<RetryPolicy> {
        let config = self
            .operations
            .get(operation)
            .ok_or_else(|| Error::unknown_policy(operation))?;
        RetryPolicy::try_from(config)
    }
}

/// Retry policy for an operation, in its configuration-file form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicyConfig {
    /// Progress message logged between attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Retries after the first attempt; -1 means unlimited
    #[serde(default = "default_retries")]
    pub retries: i64,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_delay")]
    pub delay_ms: u64,

    /// Overall deadline in seconds; 0 means none
    #[serde(default)]
    pub timeout_secs: u64,

    /// Stop on the first probe error instead of retrying it
    #[serde(default)]
    pub early_exit_on_error: bool,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            message: None,
            retries: default_retries(),
            delay_ms: default_delay(),
            timeout_secs: 0,
            early_exit_on_error: false,
        }
    }
}

fn default_retries() -> i64 {
    3
}
fn default_delay() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_operations_are_valid() {
        let config = RetryPoliciesConfig::default();
        for operation in [
            operations::TRANSACTION,
            operations::DEVICE_ONBOARDING,
            operations::CREDENTIAL_ROTATION,
            operations::CONNECTOR_DELETION,
        ] {
            assert!(
                config.policy(operation).is_ok(),
                "{} should be bounded",
                operation
            );
        }
    }

    #[test]
    fn test_transaction_policy_defaults() {
        let policy = RetryPoliciesConfig::default()
            .policy(operations::TRANSACTION)
            .unwrap();

        assert_eq!(policy.max_retries(), None);
        assert_eq!(policy.timeout(), Some(Duration::from_secs(900)));
        assert_eq!(policy.delay(), Duration::from_secs(2));
        assert!(policy.early_exit_on_error());
    }

    #[test]
    fn test_unknown_operation() {
        let config = RetryPoliciesConfig::default();
        assert!(matches!(
            config.policy("firmware-upgrade"),
            Err(Error::UnknownPolicy { .. })
        ));
        assert_eq!(config.config_for("firmware-upgrade"), &config.default);
    }

    #[test]
    fn test_parse_kebab_case_yaml() {
        let yaml = r#"
api:
  base-url: "https://edge.example.com"
retry-policies:
  default:
    retries: 5
    delay-ms: 100
  operations:
    device-onboarding:
      retries: -1
      timeout-secs: 120
      early-exit-on-error: true
"#;
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.api.base_url, "https://edge.example.com");
        assert_eq!(config.api.http_timeout_secs, 30);
        assert_eq!(config.retry_policies.default.retries, 5);
        assert_eq!(config.retry_policies.default.delay_ms, 100);

        let onboarding = &config.retry_policies.operations[operations::DEVICE_ONBOARDING];
        assert_eq!(onboarding.retries, -1);
        assert_eq!(onboarding.delay_ms, 1000);
        assert_eq!(onboarding.timeout_secs, 120);
        assert!(onboarding.early_exit_on_error);
    }

    #[test]
    fn test_user_agent_names_the_client() {
        assert!(ApiConfig::default().user_agent.starts_with("cdo/"));
    }
}
