//! Transaction command

use anyhow::{Context as _, Result};
use cdo_core::transaction::{TransactionApi, TransactionTracker};
use cdo_core::types::operations;

use super::{describe_policy, report, Context};
use crate::cli::{TransactionCommands, TransactionWaitArgs};
use crate::output;

pub async fn run(cmd: TransactionCommands, ctx: &Context) -> Result<()> {
    match cmd {
        TransactionCommands::Wait(args) => wait(args, ctx).await,
    }
}

async fn wait(args: TransactionWaitArgs, ctx: &Context) -> Result<()> {
    let policy = ctx.policy(operations::TRANSACTION, &args.policy)?;
    let tracker = TransactionTracker::new(&ctx.client).with_cancellation(ctx.cancel.clone());

    let transaction = tracker
        .api()
        .fetch(&args.polling_url)
        .await
        .with_context(|| format!("Failed to read transaction at {}", args.polling_url))?;

    let spinner = output::spinner(&format!(
        "Waiting for transaction {} ({})",
        transaction.transaction_uid,
        describe_policy(&policy)
    ));
    let result = tracker
        .wait_for_transaction_to_finish(transaction, &policy)
        .await;
    spinner.finish_and_clear();

    let transaction = result.map_err(report)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&transaction)?);
        return Ok(());
    }

    output::success(&format!(
        "{} transaction {} finished",
        transaction.transaction_type, transaction.transaction_uid
    ));
    output::kv("Entity", &transaction.entity_uid);
    output::kv("Status", &transaction.status.to_string());
    output::kv(
        "Last updated",
        &transaction.last_updated_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    Ok(())
}
