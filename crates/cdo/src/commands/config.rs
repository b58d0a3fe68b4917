//! Config command

use anyhow::Result;

use super::Context;
use crate::cli::ConfigCommands;
use crate::output;

pub fn run(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path());
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    let path = ctx.config_path();
    if !path.exists() {
        output::info(&format!("No config file at {}; using built-in defaults", path));
    }

    output::header("Runtime configuration");
    output::kv("Source", path.as_str());
    output::kv("Base URL", &ctx.runtime.api.base_url);
    println!();

    print!("{}", serde_yaml_ng::to_string(&ctx.runtime)?);

    Ok(())
}
