//! Stage command implementation.

use crate::context::Context;
use crate::output;
use anyhow::{Result, bail};
use clap::Args;
use gemstage_core::ArtifactReference;
use std::path::PathBuf;

/// Arguments for the stage command.
#[derive(Args, Debug)]
pub struct StageArgs {
    /// Path to a local .gem file
    pub artifact: PathBuf,

    /// Archive path; the compressed archive is written next to it with `.gz` appended
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory for the temporary staging root (defaults to a fresh temp dir)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
}

/// Run the stage command.
pub fn run(ctx: &Context, args: StageArgs) -> Result<()> {
    let artifact = ArtifactReference::new(ctx.path(&args.artifact));
    if !artifact.is_local_file() {
        bail!("{artifact} is not a local .gem file");
    }

    let adapter = ctx.adapter(&ctx.working_dir)?;
    let metadata = adapter.extract(&artifact)?;

    let scratch = tempfile::tempdir()?;
    let build_dir = args
        .build_dir
        .as_deref()
        .map_or_else(|| scratch.path().to_path_buf(), |dir| ctx.path(dir));

    output::step(&format!("Staging {} {}", metadata.name, metadata.version));
    let archive_path = ctx.path(&args.output);
    let archive = adapter.stage_and_archive(&artifact, &archive_path, &build_dir, &metadata)?;

    output::success("Archived");
    println!("{}", archive.display());
    Ok(())
}
