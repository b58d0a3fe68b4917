//! User-group commands

use anyhow::{Context as _, Result};
use cdo_client::user_groups::{self, UserGroup};
use cdo_core::types::operations;

use super::{describe_policy, read_input, report, Context};
use crate::cli::{ProvisionArgs, UserGroupCommands};
use crate::output;

pub async fn run(cmd: UserGroupCommands, ctx: &Context) -> Result<()> {
    match cmd {
        UserGroupCommands::Provision(args) => provision(args, ctx).await,
    }
}

async fn provision(args: ProvisionArgs, ctx: &Context) -> Result<()> {
    let groups: Vec<UserGroup> = serde_json::from_str(&read_input(&args.file)?)
        .with_context(|| format!("Failed to parse user groups from {}", args.file))?;

    if groups.is_empty() {
        output::warning(&format!("No user groups in {}", args.file));
        return Ok(());
    }

    let policy = ctx.policy(operations::TRANSACTION, &args.policy)?;

    let spinner = output::spinner(&format!(
        "Provisioning {} user group(s) ({})",
        groups.len(),
        describe_policy(&policy)
    ));
    let result = user_groups::provision(&ctx.client, &groups, &policy, &ctx.cancel).await;
    spinner.finish_and_clear();

    let transaction = result.map_err(report)?;

    output::success(&format!("Provisioned {} user group(s)", groups.len()));
    output::kv("Transaction", &transaction.transaction_uid);
    for group in &groups {
        output::kv(&group.name, &group.role);
    }

    Ok(())
}
