//! Shared state for CLI commands.

use anyhow::Context as _;
use gemstage_adapter::GemAdapter;
use gemstage_config::{AdapterConfig, ConfigLayer, ConfigLoader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global CLI context shared across all commands
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory
    pub working_dir: PathBuf,
    /// Resolved configuration
    pub config: AdapterConfig,
}

impl Context {
    /// Resolve the working directory and load configuration.
    pub fn new(
        working_dir: Option<&Path>,
        config_file: Option<&Path>,
        overrides: ConfigLayer,
    ) -> anyhow::Result<Self> {
        let working_dir = match working_dir {
            Some(dir) => std::fs::canonicalize(dir)
                .with_context(|| format!("working directory {}", dir.display()))?,
            None => std::env::current_dir()?,
        };

        let mut loader = ConfigLoader::new(&working_dir);
        if let Some(file) = config_file {
            loader = loader.with_file(working_dir.join(file));
        }
        let config = loader.resolve(overrides)?;
        debug!(config = ?config, "configuration resolved");

        Ok(Self {
            working_dir,
            config,
        })
    }

    /// Resolve `path` against the working directory.
    pub fn path(&self, path: &Path) -> PathBuf {
        self.working_dir.join(path)
    }

    /// The gem argument as the adapter should see it: a `.gem` found relative
    /// to the working directory becomes its full path, anything else is
    /// passed through as a gem name.
    pub fn identifier(&self, gem: &str) -> String {
        let local = self.path(Path::new(gem));
        if local.is_file() {
            local.to_string_lossy().into_owned()
        } else {
            gem.to_string()
        }
    }

    /// Build the adapter, downloading into `download_dir`.
    pub fn adapter(&self, download_dir: &Path) -> anyhow::Result<GemAdapter> {
        Ok(GemAdapter::from_config(&self.config, download_dir)?)
    }
}
