//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// cdo - drive long-running device-management workflows to completion
#[derive(Parser, Debug)]
#[command(name = "cdo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a runtime config file (defaults to ~/.cdo/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// API token sent as a bearer token
    #[arg(long, env = "CDO_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track server-side transactions
    #[command(subcommand)]
    Transaction(TransactionCommands),

    /// Device onboarding and credentials
    #[command(subcommand)]
    Device(DeviceCommands),

    /// Secure device connectors
    #[command(subcommand)]
    Connector(ConnectorCommands),

    /// User-group provisioning
    #[command(subcommand)]
    UserGroups(UserGroupCommands),

    /// Runtime configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Overrides for the configured retry policy
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Give up after this many seconds (0 = no deadline)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pause between polls in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay: Option<u64>,

    /// Polls after the first one (-1 = unlimited)
    #[arg(long, allow_negative_numbers = true)]
    pub retries: Option<i64>,
}

// Transaction commands
#[derive(Subcommand, Debug)]
pub enum TransactionCommands {
    /// Wait for a transaction to finish
    Wait(TransactionWaitArgs),
}

#[derive(Args, Debug)]
pub struct TransactionWaitArgs {
    /// The transaction's polling URL
    pub polling_url: String,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output the finished transaction as JSON
    #[arg(long)]
    pub json: bool,
}

// Device commands
#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    /// Wait for a device to finish onboarding
    Wait(DeviceWaitArgs),

    /// Send new credentials to a device and wait until they are applied
    RotateCredentials(RotateCredentialsArgs),
}

#[derive(Args, Debug)]
pub struct DeviceWaitArgs {
    /// Device UID
    pub uid: String,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Args, Debug)]
pub struct RotateCredentialsArgs {
    /// UID of the device-specific configuration
    pub specific_uid: String,

    /// File holding the prepared (encrypted) credentials
    #[arg(long, value_name = "FILE")]
    pub credentials_file: Utf8PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

// Connector commands
#[derive(Subcommand, Debug)]
pub enum ConnectorCommands {
    /// Delete a connector and wait until it is gone
    Delete(ConnectorArgs),

    /// Wait for a connector to become active
    Wait(ConnectorArgs),
}

#[derive(Args, Debug)]
pub struct ConnectorArgs {
    /// Connector UID
    pub uid: String,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

// User-group commands
#[derive(Subcommand, Debug)]
pub enum UserGroupCommands {
    /// Provision the user groups listed in a JSON file
    Provision(ProvisionArgs),
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// JSON file with an array of user groups
    pub file: Utf8PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved runtime configuration
    Show,

    /// Print the path of the global config file
    Path,
}
