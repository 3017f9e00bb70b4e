//! Configuration types.

use gemstage_core::RUBYGEMS_URL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Fully resolved adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdapterConfig {
    /// Install root override; disables the default binaries directory.
    pub prefix: Option<PathBuf>,
    /// Binaries directory override.
    pub gem_bin_path: Option<PathBuf>,
    /// Appended to the `rubygem` prefix when naming packages.
    pub suffix: String,
    /// Registry sources, queried in order.
    pub sources: Vec<Url>,
    /// Consider prerelease versions during resolution.
    pub allow_prerelease: bool,
    /// Verify downloads against registry checksums.
    pub verify_checksums: bool,
    /// The `gem` executable.
    pub gem_program: PathBuf,
    /// The `ruby` executable used to probe defaults.
    pub ruby_program: PathBuf,
    /// Default gem directory; probed from Ruby when unset.
    pub gem_dir: Option<PathBuf>,
    /// Default binaries directory; probed from Ruby when unset.
    pub gem_bindir: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Longest pause between HTTP reads, in seconds. Not a cap on the
    /// whole transfer.
    pub read_timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            gem_bin_path: None,
            suffix: String::new(),
            sources: Url::parse(RUBYGEMS_URL).into_iter().collect(),
            allow_prerelease: false,
            verify_checksums: true,
            gem_program: PathBuf::from("gem"),
            ruby_program: PathBuf::from("ruby"),
            gem_dir: None,
            gem_bindir: None,
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
        }
    }
}

/// One layer of partial settings (file, environment, or command line).
///
/// Set fields replace the value from lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// See [`AdapterConfig::prefix`].
    pub prefix: Option<PathBuf>,
    /// See [`AdapterConfig::gem_bin_path`].
    pub gem_bin_path: Option<PathBuf>,
    /// See [`AdapterConfig::suffix`].
    pub suffix: Option<String>,
    /// See [`AdapterConfig::sources`].
    pub sources: Option<Vec<Url>>,
    /// See [`AdapterConfig::allow_prerelease`].
    pub allow_prerelease: Option<bool>,
    /// See [`AdapterConfig::verify_checksums`].
    pub verify_checksums: Option<bool>,
    /// See [`AdapterConfig::gem_program`].
    pub gem_program: Option<PathBuf>,
    /// See [`AdapterConfig::ruby_program`].
    pub ruby_program: Option<PathBuf>,
    /// See [`AdapterConfig::gem_dir`].
    pub gem_dir: Option<PathBuf>,
    /// See [`AdapterConfig::gem_bindir`].
    pub gem_bindir: Option<PathBuf>,
    /// See [`AdapterConfig::connect_timeout_secs`].
    pub connect_timeout_secs: Option<u64>,
    /// See [`AdapterConfig::read_timeout_secs`].
    pub read_timeout_secs: Option<u64>,
}

impl AdapterConfig {
    /// Apply a layer on top of this configuration.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.prefix {
            self.prefix = Some(v);
        }
        if let Some(v) = layer.gem_bin_path {
            self.gem_bin_path = Some(v);
        }
        if let Some(v) = layer.suffix {
            self.suffix = v;
        }
        if let Some(v) = layer.sources {
            self.sources = v;
        }
        if let Some(v) = layer.allow_prerelease {
            self.allow_prerelease = v;
        }
        if let Some(v) = layer.verify_checksums {
            self.verify_checksums = v;
        }
        if let Some(v) = layer.gem_program {
            self.gem_program = v;
        }
        if let Some(v) = layer.ruby_program {
            self.ruby_program = v;
        }
        if let Some(v) = layer.gem_dir {
            self.gem_dir = Some(v);
        }
        if let Some(v) = layer.gem_bindir {
            self.gem_bindir = Some(v);
        }
        if let Some(v) = layer.connect_timeout_secs {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = layer.read_timeout_secs {
            self.read_timeout_secs = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].as_str(), RUBYGEMS_URL);
        assert!(config.prefix.is_none());
        assert!(config.suffix.is_empty());
        assert!(config.verify_checksums);
    }

    #[test]
    fn layer_overrides_only_set_fields() {
        let mut config = AdapterConfig::default();
        config.apply(ConfigLayer {
            prefix: Some("/opt/ruby".into()),
            suffix: Some("19".into()),
            ..ConfigLayer::default()
        });

        assert_eq!(config.prefix, Some(PathBuf::from("/opt/ruby")));
        assert_eq!(config.suffix, "19");
        assert_eq!(config.gem_program, PathBuf::from("gem"));
    }
}
