//! Environment variable configuration.

use crate::error::{ConfigError, Result};
use crate::types::ConfigLayer;
use std::path::PathBuf;
use url::Url;

/// Recognized environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemstageEnvVar {
    /// `GEMSTAGE_PREFIX`
    Prefix,
    /// `GEMSTAGE_GEM_BIN_PATH`
    GemBinPath,
    /// `GEMSTAGE_SUFFIX`
    Suffix,
    /// `GEMSTAGE_SOURCES`, comma separated
    Sources,
    /// `GEMSTAGE_ALLOW_PRERELEASE`
    AllowPrerelease,
    /// `GEMSTAGE_VERIFY_CHECKSUMS`
    VerifyChecksums,
    /// `GEMSTAGE_GEM`
    Gem,
    /// `GEMSTAGE_RUBY`
    Ruby,
    /// `GEMSTAGE_GEM_DIR`
    GemDir,
    /// `GEMSTAGE_GEM_BINDIR`
    GemBindir,
}

impl GemstageEnvVar {
    /// Every variable, in the order they are read.
    pub const ALL: [Self; 10] = [
        Self::Prefix,
        Self::GemBinPath,
        Self::Suffix,
        Self::Sources,
        Self::AllowPrerelease,
        Self::VerifyChecksums,
        Self::Gem,
        Self::Ruby,
        Self::GemDir,
        Self::GemBindir,
    ];

    /// Get the variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "GEMSTAGE_PREFIX",
            Self::GemBinPath => "GEMSTAGE_GEM_BIN_PATH",
            Self::Suffix => "GEMSTAGE_SUFFIX",
            Self::Sources => "GEMSTAGE_SOURCES",
            Self::AllowPrerelease => "GEMSTAGE_ALLOW_PRERELEASE",
            Self::VerifyChecksums => "GEMSTAGE_VERIFY_CHECKSUMS",
            Self::Gem => "GEMSTAGE_GEM",
            Self::Ruby => "GEMSTAGE_RUBY",
            Self::GemDir => "GEMSTAGE_GEM_DIR",
            Self::GemBindir => "GEMSTAGE_GEM_BINDIR",
        }
    }
}

/// Reads a [`ConfigLayer`] from environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable holds an unusable value.
    pub fn from_process_env() -> Result<ConfigLayer> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup. Empty values count as unset.
    ///
    /// # Errors
    /// Returns error if a variable holds an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ConfigLayer> {
        let get = |var: GemstageEnvVar| lookup(var.as_str()).filter(|v| !v.trim().is_empty());

        let mut layer = ConfigLayer {
            prefix: get(GemstageEnvVar::Prefix).map(PathBuf::from),
            gem_bin_path: get(GemstageEnvVar::GemBinPath).map(PathBuf::from),
            suffix: get(GemstageEnvVar::Suffix),
            gem_program: get(GemstageEnvVar::Gem).map(PathBuf::from),
            ruby_program: get(GemstageEnvVar::Ruby).map(PathBuf::from),
            gem_dir: get(GemstageEnvVar::GemDir).map(PathBuf::from),
            gem_bindir: get(GemstageEnvVar::GemBindir).map(PathBuf::from),
            ..ConfigLayer::default()
        };

        if let Some(raw) = get(GemstageEnvVar::Sources) {
            layer.sources = Some(parse_sources(GemstageEnvVar::Sources.as_str(), &raw)?);
        }
        if let Some(raw) = get(GemstageEnvVar::AllowPrerelease) {
            layer.allow_prerelease = Some(parse_bool(
                GemstageEnvVar::AllowPrerelease.as_str(),
                &raw,
            )?);
        }
        if let Some(raw) = get(GemstageEnvVar::VerifyChecksums) {
            layer.verify_checksums = Some(parse_bool(
                GemstageEnvVar::VerifyChecksums.as_str(),
                &raw,
            )?);
        }

        Ok(layer)
    }
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
///
/// # Errors
/// Returns error for anything else.
pub fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}

/// Parse a comma-separated list of source URLs.
///
/// # Errors
/// Returns error if any entry is not a URL.
pub fn parse_sources(key: &str, raw: &str) -> Result<Vec<Url>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Url::parse(s).map_err(|e| ConfigError::invalid(key, s, e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_var_names() {
        assert_eq!(GemstageEnvVar::Prefix.as_str(), "GEMSTAGE_PREFIX");
        assert_eq!(GemstageEnvVar::GemBinPath.as_str(), "GEMSTAGE_GEM_BIN_PATH");
    }

    #[test]
    fn reads_layer() {
        let layer = EnvConfig::from_lookup(lookup(&[
            ("GEMSTAGE_PREFIX", "/opt/gems"),
            ("GEMSTAGE_SUFFIX", "19"),
            ("GEMSTAGE_SOURCES", "https://a.example/, https://b.example/"),
            ("GEMSTAGE_ALLOW_PRERELEASE", "yes"),
            ("GEMSTAGE_GEM_BIN_PATH", ""),
        ]))
        .unwrap();

        assert_eq!(layer.prefix, Some(PathBuf::from("/opt/gems")));
        assert_eq!(layer.suffix.as_deref(), Some("19"));
        assert_eq!(layer.sources.as_ref().map(Vec::len), Some(2));
        assert_eq!(layer.allow_prerelease, Some(true));
        assert!(layer.gem_bin_path.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        let err = EnvConfig::from_lookup(lookup(&[("GEMSTAGE_ALLOW_PRERELEASE", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMSTAGE_ALLOW_PRERELEASE"));

        assert!(EnvConfig::from_lookup(lookup(&[("GEMSTAGE_SOURCES", "not a url")])).is_err());
    }
}
