//! CLI commands for gemstage.

pub mod convert;
pub mod fetch;
pub mod metadata;
pub mod stage;

use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};
use gemstage_config::ConfigLayer;
use gemstage_core::VersionConstraint;
use std::path::PathBuf;
use url::Url;

/// gemstage - turn RubyGems into distribution packages
#[derive(Parser, Debug)]
#[command(name = "gemstage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Config file (defaults to gemstage.json in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and download a gem
    Fetch(fetch::FetchArgs),

    /// Print normalized package metadata as JSON
    Metadata(metadata::MetadataArgs),

    /// Install a local .gem into a staging root and archive it
    Stage(stage::StageArgs),

    /// Fetch, normalize and archive in one go
    Convert(convert::ConvertArgs),
}

/// Settings that override the config file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Install root for the gem's files
    #[arg(long, global = true)]
    pub prefix: Option<PathBuf>,

    /// Directory for the gem's executables
    #[arg(long, global = true)]
    pub gem_bin_path: Option<PathBuf>,

    /// Suffix appended to the package name prefix
    #[arg(long, global = true)]
    pub suffix: Option<String>,

    /// Registry source, may be repeated
    #[arg(long = "source", global = true)]
    pub sources: Vec<Url>,

    /// Consider prerelease versions
    #[arg(long, global = true)]
    pub prerelease: bool,

    /// Skip checksum verification of downloads
    #[arg(long, global = true)]
    pub no_verify: bool,
}

impl OverrideArgs {
    /// Highest-priority configuration layer.
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            prefix: self.prefix.clone(),
            gem_bin_path: self.gem_bin_path.clone(),
            suffix: self.suffix.clone(),
            sources: (!self.sources.is_empty()).then(|| self.sources.clone()),
            allow_prerelease: self.prerelease.then_some(true),
            verify_checksums: self.no_verify.then_some(false),
            ..ConfigLayer::default()
        }
    }
}

/// A gem name or path to a local `.gem`, with an optional constraint.
#[derive(Args, Debug, Clone)]
pub struct GemArgs {
    /// Gem name or path to a local .gem file
    pub gem: String,

    /// Version constraint, e.g. ">= 1.0, < 2.0"
    #[arg(long)]
    pub constraint: Option<String>,
}

impl GemArgs {
    /// Parsed constraint, if one was given.
    pub fn constraint(&self) -> anyhow::Result<Option<VersionConstraint>> {
        self.constraint
            .as_deref()
            .map(VersionConstraint::parse)
            .transpose()
            .context("invalid --constraint")
    }
}
