//! The normalized metadata record handed to downstream package writers.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Namespace token for packages produced from gems.
pub const ECOSYSTEM_PREFIX: &str = "rubygem";

/// Sentinel for descriptor fields that could not be read.
pub const UNKNOWN: &str = "unknown";

/// Fixed package category for everything this adapter emits.
pub const CATEGORY: &str = "Languages/Development/Ruby";

/// Outcome of reading one descriptor field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    /// Field exists and was read.
    Present(T),
    /// Field is missing or null.
    Absent,
    /// Field exists but has the wrong shape.
    Unreadable(String),
}

impl<T> FieldValue<T> {
    /// Drop the absent/unreadable distinction.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Unreadable(_) => None,
        }
    }
}

impl FieldValue<String> {
    /// Collapse to a plain string, using [`UNKNOWN`] for anything not present.
    #[must_use]
    pub fn or_unknown(self) -> String {
        self.into_option().unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Naming rules: `rubygem<suffix>-<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageNaming {
    suffix: String,
}

impl PackageNaming {
    /// Create naming rules with a caller-supplied suffix (may be empty).
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Get the suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Namespace a gem name.
    #[must_use]
    pub fn package_name(&self, gem_name: &str) -> String {
        format!("{ECOSYSTEM_PREFIX}{}-{gem_name}", self.suffix)
    }
}

/// Canonical metadata for one converted gem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    /// Namespaced package name.
    pub name: String,
    /// Version, or [`UNKNOWN`].
    pub version: String,
    /// License, or [`UNKNOWN`].
    pub license: String,
    /// One-line summary, or [`UNKNOWN`].
    pub summary: String,
    /// Long description, or [`UNKNOWN`].
    pub description: String,
    /// First listed author.
    pub maintainer: Option<String>,
    /// Project homepage.
    pub url: Option<String>,
    /// Package category.
    pub category: String,
    /// Executables shipped by the gem.
    #[serde(default)]
    pub executables: Vec<String>,
    /// Single-clause dependency requirements, e.g. `rubygem-rack >= 1.0`.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl NormalizedMetadata {
    /// Whether a binaries directory needs staging.
    #[must_use]
    pub fn has_executables(&self) -> bool {
        !self.executables.is_empty()
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(sonic_rs::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    /// Returns error if JSON is invalid.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(sonic_rs::from_str(s)?)
    }
}
