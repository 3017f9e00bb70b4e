//! Synchronous process spawning.
//!
//! The adapter runs external tools (`gem install`, `ruby -e`) to completion
//! and inspects their exit status; there is no timeout or process-group
//! handling because cancellation belongs to the caller.

use crate::{PlatformError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Process builder.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    /// Program to execute.
    program: PathBuf,
    /// Arguments.
    args: Vec<OsString>,
    /// Pipe stdout and stderr instead of inheriting them.
    capture: bool,
}

impl ProcessBuilder {
    /// Create a new process builder.
    #[must_use]
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            capture: false,
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Capture stdout and stderr.
    #[must_use]
    pub const fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Render as a shell-like line for logs.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_command(&self) -> Command {
        let output = || {
            if self.capture {
                Stdio::piped()
            } else {
                Stdio::inherit()
            }
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output());
        cmd
    }

    /// Execute and wait for completion.
    ///
    /// A non-zero exit is not an error here; see [`ProcessOutput::into_result`].
    ///
    /// # Errors
    /// Returns error if the process cannot be spawned.
    pub fn run(self) -> Result<ProcessOutput> {
        debug!(command = %self.display_command(), "spawning");
        let output = self.build_command().output().map_err(|e| {
            PlatformError::spawn_failed(self.program.display().to_string(), e.to_string())
        })?;

        Ok(ProcessOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Output from a completed process.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Captured stdout.
    pub stdout: Vec<u8>,
    /// Captured stderr.
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Get stdout as trimmed string.
    #[must_use]
    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Convert to Result, returning Err if process failed.
    ///
    /// # Errors
    /// Returns error with stderr if process exited with non-zero status.
    pub fn into_result(self) -> Result<Self> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(PlatformError::ProcessFailed {
                code: self.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
            })
        }
    }
}
