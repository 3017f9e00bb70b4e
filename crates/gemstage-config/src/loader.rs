//! Layered configuration loading.

use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::types::{AdapterConfig, ConfigLayer};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gemstage.json";

/// Where a layer came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Default,
    /// Config file.
    File,
    /// `GEMSTAGE_*` environment variables.
    Environment,
    /// Command-line arguments.
    Cli,
}

/// Merges defaults, config file, environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    working_dir: PathBuf,
    config_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at `working_dir`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            config_file: None,
        }
    }

    /// Use an explicit config file. Unlike the default file, it must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Path of the config file that will be consulted.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.working_dir.join(CONFIG_FILE_NAME))
    }

    /// Resolve against the process environment.
    ///
    /// # Errors
    /// Returns error if any layer is unreadable or the result is invalid.
    pub fn resolve(&self, cli: ConfigLayer) -> Result<AdapterConfig> {
        self.resolve_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Resolve with a custom environment lookup.
    ///
    /// # Errors
    /// Returns error if any layer is unreadable or the result is invalid.
    pub fn resolve_with_env(
        &self,
        cli: ConfigLayer,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AdapterConfig> {
        let mut config = AdapterConfig::default();

        if let Some(layer) = self.load_file()? {
            debug!(
                source = ?ConfigSource::File,
                path = %self.config_path().display(),
                "applying config layer"
            );
            config.apply(layer);
        }

        debug!(source = ?ConfigSource::Environment, "applying config layer");
        config.apply(EnvConfig::from_lookup(lookup)?);

        debug!(source = ?ConfigSource::Cli, "applying config layer");
        config.apply(cli);

        validate(&config)?;
        Ok(config)
    }

    fn load_file(&self) -> Result<Option<ConfigLayer>> {
        let path = self.config_path();
        if !path.exists() {
            if self.config_file.is_some() {
                return Err(ConfigError::io(
                    &path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                ));
            }
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let layer: ConfigLayer =
            sonic_rs::from_str(&content).map_err(|e| ConfigError::json(&path, &e))?;
        Ok(Some(layer))
    }
}

/// Check a merged configuration.
///
/// # Errors
/// Returns error naming the first offending setting.
pub fn validate(config: &AdapterConfig) -> Result<()> {
    if config.sources.is_empty() {
        return Err(ConfigError::invalid("sources", "", "at least one source is required"));
    }
    for source in &config.sources {
        if !matches!(source.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("sources", source, "must be an http(s) URL"));
        }
    }

    check_absolute("prefix", config.prefix.as_deref())?;
    check_absolute("gem-bin-path", config.gem_bin_path.as_deref())?;
    check_absolute("gem-dir", config.gem_dir.as_deref())?;
    check_absolute("gem-bindir", config.gem_bindir.as_deref())?;

    if config.suffix.contains(char::is_whitespace) {
        return Err(ConfigError::invalid("suffix", &config.suffix, "must not contain whitespace"));
    }
    Ok(())
}

fn check_absolute(key: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) if !p.is_absolute() => Err(ConfigError::invalid(
            key,
            p.display(),
            "must be an absolute path",
        )),
        _ => Ok(()),
    }
}
