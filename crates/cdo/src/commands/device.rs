//! Device commands

use anyhow::Result;
use cdo_client::devices;
use cdo_core::types::operations;

use super::{describe_policy, read_input, report, Context};
use crate::cli::{DeviceCommands, DeviceWaitArgs, RotateCredentialsArgs};
use crate::output;

pub async fn run(cmd: DeviceCommands, ctx: &Context) -> Result<()> {
    match cmd {
        DeviceCommands::Wait(args) => wait(args, ctx).await,
        DeviceCommands::RotateCredentials(args) => rotate_credentials(args, ctx).await,
    }
}

async fn wait(args: DeviceWaitArgs, ctx: &Context) -> Result<()> {
    let policy = ctx.policy(operations::DEVICE_ONBOARDING, &args.policy)?;

    let spinner = output::spinner(&format!(
        "Waiting for device {} to onboard ({})",
        args.uid,
        describe_policy(&policy)
    ));
    let result = devices::wait_until_onboarded(&ctx.client, &args.uid, &policy, &ctx.cancel).await;
    spinner.finish_and_clear();

    let device = result.map_err(report)?;

    output::success(&format!("Device {} onboarded", device.uid));
    if let Some(name) = &device.name {
        output::kv("Name", name);
    }
    output::kv("State", &device.state);
    output::kv("Status", &device.status);
    output::kv("Connectivity", &device.connectivity_state.to_string());

    Ok(())
}

async fn rotate_credentials(args: RotateCredentialsArgs, ctx: &Context) -> Result<()> {
    let policy = ctx.policy(operations::CREDENTIAL_ROTATION, &args.policy)?;
    let credentials = read_input(&args.credentials_file)?;

    let spinner = output::spinner(&format!(
        "Rotating credentials for {} ({})",
        args.specific_uid,
        describe_policy(&policy)
    ));
    let result = devices::rotate_credentials(
        &ctx.client,
        &args.specific_uid,
        credentials.trim(),
        &policy,
        &ctx.cancel,
    )
    .await;
    spinner.finish_and_clear();

    let config = result.map_err(report)?;

    output::success(&format!("Credentials applied to {}", config.uid));
    output::kv("State", &config.state);

    Ok(())
}
