//! Ruby environment discovery.
//!
//! The stager needs RubyGems' own idea of where gems and their executables
//! live (`Gem.dir` and `Gem.bindir`) when no override is configured.

use crate::process::ProcessBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fallback gem directory when Ruby cannot be queried.
pub const DEFAULT_GEM_DIR: &str = "/usr/lib/ruby/gems";

/// Fallback executable directory when Ruby cannot be queried.
pub const DEFAULT_GEM_BINDIR: &str = "/usr/bin";

/// Default install locations reported by RubyGems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyEnvironment {
    gem_dir: PathBuf,
    bin_dir: PathBuf,
}

impl RubyEnvironment {
    /// Create from known directories.
    #[must_use]
    pub fn new(gem_dir: impl Into<PathBuf>, bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            gem_dir: gem_dir.into(),
            bin_dir: bin_dir.into(),
        }
    }

    /// Ask `ruby` for `Gem.dir` and `Gem.bindir`.
    ///
    /// Each directory falls back to its built-in default independently when
    /// the query fails or prints something that is not an absolute path.
    #[must_use]
    pub fn probe(ruby: impl AsRef<Path>) -> Self {
        let ruby = ruby.as_ref();
        Self {
            gem_dir: query(ruby, "Gem.dir").unwrap_or_else(|| PathBuf::from(DEFAULT_GEM_DIR)),
            bin_dir: query(ruby, "Gem.bindir")
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GEM_BINDIR)),
        }
    }

    /// Get the gem directory.
    #[must_use]
    pub fn gem_dir(&self) -> &Path {
        &self.gem_dir
    }

    /// Get the executable directory.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }
}

impl Default for RubyEnvironment {
    fn default() -> Self {
        Self::new(DEFAULT_GEM_DIR, DEFAULT_GEM_BINDIR)
    }
}

fn query(ruby: &Path, expression: &str) -> Option<PathBuf> {
    let output = ProcessBuilder::new(ruby)
        .arg("-e")
        .arg(format!("print {expression}"))
        .capture()
        .run()
        .and_then(crate::ProcessOutput::into_result);

    match output {
        Ok(output) => {
            let value = PathBuf::from(output.stdout_trimmed());
            if value.is_absolute() {
                debug!(expression, path = %value.display(), "ruby environment");
                Some(value)
            } else {
                warn!(expression, output = %value.display(), "ruby printed a relative path");
                None
            }
        }
        Err(e) => {
            warn!(expression, error = %e, "could not query ruby, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let env = RubyEnvironment::default();
        assert_eq!(env.gem_dir(), Path::new(DEFAULT_GEM_DIR));
        assert_eq!(env.bin_dir(), Path::new(DEFAULT_GEM_BINDIR));
    }

    #[test]
    fn probe_without_ruby_falls_back() {
        let env = RubyEnvironment::probe("nonexistent_ruby_12345");
        assert_eq!(env, RubyEnvironment::default());
    }

    #[cfg(unix)]
    #[test]
    fn probe_with_fake_ruby() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ruby");
        std::fs::write(
            &script,
            "#!/bin/sh\ncase \"$2\" in\n  *bindir*) printf /opt/ruby/bin ;;\n  *) printf /opt/ruby/gems ;;\nesac\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let env = RubyEnvironment::probe(&script);
        assert_eq!(env.gem_dir(), Path::new("/opt/ruby/gems"));
        assert_eq!(env.bin_dir(), Path::new("/opt/ruby/bin"));
    }
}
