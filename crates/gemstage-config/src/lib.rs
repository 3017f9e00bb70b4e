//! Layered configuration for the gemstage adapter.
//!
//! Sources are merged in priority order:
//!
//! 1. Built-in defaults
//! 2. Config file (`gemstage.json` in the working directory, or `--config`)
//! 3. Environment variables (`GEMSTAGE_*`)
//! 4. CLI arguments
//!
//! # Environment Variables
//!
//! - `GEMSTAGE_PREFIX` - Install root override
//! - `GEMSTAGE_GEM_BIN_PATH` - Binaries directory override
//! - `GEMSTAGE_SUFFIX` - Package name suffix
//! - `GEMSTAGE_SOURCES` - Comma-separated registry URLs
//! - `GEMSTAGE_ALLOW_PRERELEASE` - Consider prerelease versions
//! - `GEMSTAGE_VERIFY_CHECKSUMS` - Verify downloads against registry checksums
//! - `GEMSTAGE_GEM`, `GEMSTAGE_RUBY` - Tool locations
//! - `GEMSTAGE_GEM_DIR`, `GEMSTAGE_GEM_BINDIR` - Skip probing Ruby for defaults
//!
//! # Example
//!
//! ```no_run
//! use gemstage_config::{ConfigLayer, ConfigLoader};
//!
//! let config = ConfigLoader::new(".")
//!     .resolve(ConfigLayer::default())
//!     .expect("failed to resolve config");
//! println!("sources: {:?}", config.sources);
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod env;
pub mod error;
pub mod loader;
pub mod types;

pub use env::{EnvConfig, GemstageEnvVar, parse_bool, parse_sources};
pub use error::{ConfigError, Result};
pub use loader::{CONFIG_FILE_NAME, ConfigLoader, ConfigSource, validate};
pub use types::{AdapterConfig, ConfigLayer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_config_path() {
        let loader = ConfigLoader::new("/tmp/project");
        assert!(loader.config_path().ends_with(CONFIG_FILE_NAME));

        let loader = loader.with_file("/etc/gemstage.json");
        assert_eq!(loader.config_path(), std::path::PathBuf::from("/etc/gemstage.json"));
    }

    #[test]
    fn config_error_converts_to_core() {
        let err: gemstage_core::Error = ConfigError::invalid("suffix", "a b", "bad").into();
        assert!(matches!(err, gemstage_core::Error::Config(_)));
    }
}
