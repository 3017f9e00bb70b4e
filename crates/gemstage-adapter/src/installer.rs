//! The installer capability.

use gemstage_core::{Error, Result};
use gemstage_platform::{PlatformError, ProcessBuilder, ProcessOutput};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Materializes a gem into staging directories.
pub trait Installer: Send + Sync {
    /// Install `artifact` into `install_dir`, placing executables in
    /// `bin_dir` when given.
    ///
    /// # Errors
    /// Returns [`Error::InstallFailed`] if installation does not succeed.
    fn install(&self, artifact: &Path, install_dir: &Path, bin_dir: Option<&Path>) -> Result<()>;
}

/// Runs `gem install`.
#[derive(Debug, Clone)]
pub struct GemInstaller {
    program: PathBuf,
}

impl GemInstaller {
    /// Use the given `gem` executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The command that would be run.
    #[must_use]
    pub fn command(
        &self,
        artifact: &Path,
        install_dir: &Path,
        bin_dir: Option<&Path>,
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .args(["install", "--quiet", "--no-document", "--install-dir"])
            .arg(install_dir)
            .arg("--ignore-dependencies");
        if let Some(bin_dir) = bin_dir {
            cmd = cmd.arg("--bindir").arg(bin_dir);
        }
        cmd.arg(artifact).capture()
    }
}

impl Default for GemInstaller {
    fn default() -> Self {
        Self::new("gem")
    }
}

impl Installer for GemInstaller {
    fn install(&self, artifact: &Path, install_dir: &Path, bin_dir: Option<&Path>) -> Result<()> {
        let cmd = self.command(artifact, install_dir, bin_dir);
        info!(command = %cmd.display_command(), "installing gem");

        let failed = |err: PlatformError| Error::InstallFailed {
            artifact: artifact.to_path_buf(),
            code: err.exit_code(),
            stderr: match err {
                PlatformError::ProcessFailed { stderr, .. } => stderr,
                other => other.to_string(),
            },
        };

        let output = cmd.run().and_then(ProcessOutput::into_result).map_err(failed)?;
        debug!(stdout = %output.stdout_trimmed(), "gem install finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line() {
        let installer = GemInstaller::default();
        let cmd = installer.command(
            Path::new("/tmp/demo-1.0.gem"),
            Path::new("/build/x.dir/usr/lib/ruby/gems"),
            Some(Path::new("/build/x.dir/usr/bin")),
        );
        assert_eq!(
            cmd.display_command(),
            "gem install --quiet --no-document --install-dir /build/x.dir/usr/lib/ruby/gems \
             --ignore-dependencies --bindir /build/x.dir/usr/bin /tmp/demo-1.0.gem"
        );

        let cmd = installer.command(Path::new("demo.gem"), Path::new("/p"), None);
        assert!(!cmd.display_command().contains("--bindir"));
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("gem");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn runs_program() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("args");
        let gem = script(dir.path(), &format!("echo \"$@\" > {}", log.display()));

        GemInstaller::new(gem)
            .install(Path::new("demo.gem"), Path::new("/stage"), None)
            .unwrap();

        let args = std::fs::read_to_string(log).unwrap();
        assert!(args.starts_with("install --quiet --no-document --install-dir /stage"));
        assert!(args.trim_end().ends_with("demo.gem"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_install_failed() {
        let dir = tempfile::tempdir().unwrap();
        let gem = script(dir.path(), "echo 'ERROR: bad gem' >&2\nexit 3");

        let err = GemInstaller::new(gem)
            .install(Path::new("demo.gem"), Path::new("/stage"), None)
            .unwrap_err();
        match err {
            Error::InstallFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "ERROR: bad gem");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_install_failed() {
        let err = GemInstaller::new("nonexistent_gem_12345")
            .install(Path::new("demo.gem"), Path::new("/stage"), None)
            .unwrap_err();
        assert!(matches!(err, Error::InstallFailed { code: -1, .. }));
    }
}
