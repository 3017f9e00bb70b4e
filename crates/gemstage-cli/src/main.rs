//! gemstage CLI - turn RubyGems into distribution packages.
//!
//! Resolves a gem against RubyGems-compatible registries, normalizes its
//! specification into package metadata and stages its installed files into
//! a compressed archive ready for a packager.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod context;
mod output;

use clap::Parser;
use commands::{Cli, Commands};
use context::Context;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    output::init(cli.quiet);

    let ctx = match Context::new(
        cli.working_dir.as_deref(),
        cli.config.as_deref(),
        cli.overrides.to_layer(),
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            output::error(&format!("failed to initialize: {e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::error(&format!("failed to create runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(cli.command, &ctx)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Fetch(args) => commands::fetch::run(ctx, args).await,
        Commands::Metadata(args) => commands::metadata::run(ctx, args).await,
        Commands::Stage(args) => commands::stage::run(ctx, args),
        Commands::Convert(args) => commands::convert::run(ctx, args).await,
    }
}
