//! Core types and utilities for gemstage.
//!
//! Shared by every phase of the adapter:
//!
//! - [`ArtifactReference`] and [`Identifier`] for the artifact being converted
//! - [`GemVersion`] and [`VersionConstraint`] with RubyGems ordering rules
//! - [`NormalizedMetadata`], the record handed to the pipeline orchestrator
//! - [`Error`], the error type every phase surfaces

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod version;

pub use artifact::{ArtifactReference, Identifier, is_bare_name};
pub use error::{Error, Result};
pub use hash::{Checksum, ChecksumHasher};
pub use metadata::{
    CATEGORY, ECOSYSTEM_PREFIX, FieldValue, NormalizedMetadata, PackageNaming, UNKNOWN,
};
pub use version::{GemVersion, Operator, VersionConstraint};

/// The public RubyGems registry, the default source.
pub const RUBYGEMS_URL: &str = "https://rubygems.org/";
