//! CLI command implementations

pub mod config;
pub mod connector;
pub mod device;
pub mod transaction;
pub mod user_groups;

use std::time::Duration;

use anyhow::{Context as _, Result};
use camino::{Utf8Path, Utf8PathBuf};
use cdo_client::{CdoClient, ClientConfig};
use cdo_core::retry::RetryPolicy;
use cdo_core::types::{RetryPolicyConfig, RuntimeConfig};
use cdo_core::{HierarchicalConfigLoader, WorkflowError};
use tokio_util::sync::CancellationToken;

use crate::cli::PolicyArgs;
use crate::output;

/// Everything a command needs: resolved config, client and the Ctrl-C token
pub struct Context {
    pub loader: HierarchicalConfigLoader,
    pub config_file: Option<Utf8PathBuf>,
    pub runtime: RuntimeConfig,
    pub client: CdoClient,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn load(
        config_file: Option<Utf8PathBuf>,
        api_token: Option<String>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let loader = HierarchicalConfigLoader::new()?;
        let runtime = match &config_file {
            Some(path) => loader.load_runtime_config_from(path)?,
            None => loader.load_runtime_config()?,
        };

        let mut client_config = ClientConfig::from_api_config(&runtime.api);
        if let Some(token) = api_token {
            client_config = client_config.with_token(token);
        }
        let client = CdoClient::new(client_config).context("Failed to create API client")?;
        tracing::debug!(base_url = %client.base_url(), "API client ready");

        Ok(Self {
            loader,
            config_file,
            runtime,
            client,
            cancel,
        })
    }

    /// The config file in effect: the explicit one or the global one
    pub fn config_path(&self) -> Utf8PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.loader.config_path())
    }

    /// Configured policy for `operation` with command-line overrides applied
    pub fn policy(&self, operation: &str, overrides: &PolicyArgs) -> Result<RetryPolicy> {
        let config = apply_overrides(self.runtime.retry_policies.config_for(operation), overrides);
        RetryPolicy::try_from(&config)
            .with_context(|| format!("Invalid retry policy for {}", operation))
    }
}

fn apply_overrides(base: &RetryPolicyConfig, overrides: &PolicyArgs) -> RetryPolicyConfig {
    let mut config = base.clone();
    if let Some(timeout) = overrides.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(delay) = overrides.delay {
        config.delay_ms = delay;
    }
    if let Some(retries) = overrides.retries {
        config.retries = retries;
    }
    config
}

/// Human summary of the bounds a wait runs under
pub fn describe_policy(policy: &RetryPolicy) -> String {
    let attempts = match policy.max_attempts() {
        Some(n) => format!("up to {} polls", n),
        None => "unlimited polls".to_string(),
    };
    match policy.timeout() {
        Some(timeout) => format!(
            "{} every {}, giving up after {}",
            attempts,
            format_duration(policy.delay()),
            format_duration(timeout)
        ),
        None => format!("{} every {}", attempts, format_duration(policy.delay())),
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 || secs % 60 != 0 {
        format!("{}s", secs)
    } else {
        format!("{}m", secs / 60)
    }
}

/// Print a short note for cancellations and timeouts before handing the
/// error back; the error text itself is printed unchanged by `main`
pub fn report(err: WorkflowError) -> anyhow::Error {
    if err.is_cancelled() {
        output::warning("Interrupted; stopped waiting");
    } else if err.is_timeout() {
        output::warning("The operation may still finish on the server");
    }
    anyhow::Error::new(err)
}

/// Read a file referenced on the command line
pub fn read_input(path: &Utf8Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}
