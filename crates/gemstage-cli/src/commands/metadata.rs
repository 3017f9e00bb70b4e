//! Metadata command implementation.

use super::GemArgs;
use crate::context::Context;
use anyhow::Result;
use clap::Args;

/// Arguments for the metadata command.
#[derive(Args, Debug)]
pub struct MetadataArgs {
    #[command(flatten)]
    pub gem: GemArgs,
}

/// Run the metadata command.
pub async fn run(ctx: &Context, args: MetadataArgs) -> Result<()> {
    let constraint = args.gem.constraint()?;
    let adapter = ctx.adapter(&ctx.working_dir)?;

    let identifier = ctx.identifier(&args.gem.gem);
    let artifact = adapter.acquire(&identifier, constraint.as_ref()).await?;
    let metadata = adapter.extract(&artifact)?;

    println!("{}", metadata.to_json()?);
    Ok(())
}
