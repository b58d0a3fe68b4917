//! cdo CLI - wait on long-running device-management workflows
//!
//! Entry point for the `cdo` command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::Context;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Ctrl-C cancels the running wait
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = Context::load(cli.config, cli.api_token, cancel)?;

    match cli.command {
        Commands::Transaction(cmd) => commands::transaction::run(cmd, &ctx).await,
        Commands::Device(cmd) => commands::device::run(cmd, &ctx).await,
        Commands::Connector(cmd) => commands::connector::run(cmd, &ctx).await,
        Commands::UserGroups(cmd) => commands::user_groups::run(cmd, &ctx).await,
        Commands::Config(cmd) => commands::config::run(cmd, &ctx),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Progress messages from the retry loop are logged at info
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
