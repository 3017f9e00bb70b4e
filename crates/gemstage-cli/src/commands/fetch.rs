//! Fetch command implementation.

use super::GemArgs;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub gem: GemArgs,

    /// Directory to download into (defaults to the working directory)
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,
}

/// Run the fetch command.
pub async fn run(ctx: &Context, args: FetchArgs) -> Result<()> {
    let constraint = args.gem.constraint()?;
    let download_dir = args
        .download_dir
        .as_deref()
        .map_or_else(|| ctx.working_dir.clone(), |dir| ctx.path(dir));
    let adapter = ctx.adapter(&download_dir)?;

    output::step(&format!("Resolving {}", style(&args.gem.gem).yellow()));
    let identifier = ctx.identifier(&args.gem.gem);
    let artifact = adapter.acquire(&identifier, constraint.as_ref()).await?;

    output::success("Fetched");
    println!("{artifact}");
    Ok(())
}
