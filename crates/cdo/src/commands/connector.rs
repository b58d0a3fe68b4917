//! Connector commands

use anyhow::Result;
use cdo_client::connectors;
use cdo_core::types::operations;

use super::{describe_policy, report, Context};
use crate::cli::{ConnectorArgs, ConnectorCommands};
use crate::output;

pub async fn run(cmd: ConnectorCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConnectorCommands::Delete(args) => delete(args, ctx).await,
        ConnectorCommands::Wait(args) => wait(args, ctx).await,
    }
}

async fn delete(args: ConnectorArgs, ctx: &Context) -> Result<()> {
    let policy = ctx.policy(operations::CONNECTOR_DELETION, &args.policy)?;

    let spinner = output::spinner(&format!(
        "Deleting connector {} ({})",
        args.uid,
        describe_policy(&policy)
    ));
    let result = connectors::delete(&ctx.client, &args.uid, &policy, &ctx.cancel).await;
    spinner.finish_and_clear();

    result.map_err(report)?;
    output::success(&format!("Connector {} deleted", args.uid));

    Ok(())
}

async fn wait(args: ConnectorArgs, ctx: &Context) -> Result<()> {
    // Connectors onboard under the same bounds as devices
    let policy = ctx.policy(operations::DEVICE_ONBOARDING, &args.policy)?;

    let spinner = output::spinner(&format!(
        "Waiting for connector {} to become active ({})",
        args.uid,
        describe_policy(&policy)
    ));
    let result = connectors::wait_until_active(&ctx.client, &args.uid, &policy, &ctx.cancel).await;
    spinner.finish_and_clear();

    let connector = result.map_err(report)?;

    output::success(&format!("Connector {} is active", connector.uid));
    if let Some(name) = &connector.name {
        output::kv("Name", name);
    }

    Ok(())
}
