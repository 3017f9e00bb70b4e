//! Artifact references and input classification.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Path to the local `.gem` file a run operates on.
///
/// Acquisition produces a new reference instead of rewriting an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    path: PathBuf,
}

impl ArtifactReference {
    /// Create a reference to a local file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the referenced path is an existing regular file.
    #[must_use]
    pub fn is_local_file(&self) -> bool {
        self.path.is_file()
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for ArtifactReference {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// What the user handed the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// An existing local file; acquisition is skipped.
    LocalFile(ArtifactReference),
    /// A bare gem name to look up in the registry.
    BareName(String),
}

impl Identifier {
    /// Classify raw input.
    ///
    /// Existing files win over the name check, so `rack` resolves to a local
    /// file named `rack` when one exists.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIdentifier`] when the input is neither.
    pub fn classify(input: &str) -> Result<Self> {
        let reference = ArtifactReference::new(input);
        if reference.is_local_file() {
            return Ok(Self::LocalFile(reference));
        }
        if is_bare_name(input) {
            return Ok(Self::BareName(input.to_string()));
        }
        Err(Error::InvalidIdentifier {
            identifier: input.to_string(),
        })
    }
}

/// Check a string against `^[A-Za-z0-9_-]+$`.
#[must_use]
pub fn is_bare_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
