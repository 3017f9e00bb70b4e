//! RubyGems registry client for gemstage.
//!
//! Resolution asks a [`Registry`] for the releases of a gem that satisfy a
//! requirement and picks the highest one with [`select_best`]. The
//! [`RubyGemsClient`] implementation talks to rubygems.org or any compatible
//! mirror, querying each configured source in turn.
//!
//! ## Example
//!
//! ```no_run
//! use gemstage_core::VersionConstraint;
//! use gemstage_repository::{Registry, RubyGemsClient, select_best};
//!
//! # async fn example() -> gemstage_repository::Result<()> {
//! let client = RubyGemsClient::new()?;
//! let constraint = VersionConstraint::parse("~> 13.0").expect("valid requirement");
//!
//! if let Some(query) = client.fetch_with_errors("rake", &constraint, false).await {
//!     for error in &query.errors {
//!         eprintln!("source failed: {error}");
//!     }
//!     if let Some(best) = select_best(&query.candidates, &constraint, false) {
//!         println!("{} from {}", best.file_name(), best.download_url()?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod registry;
pub mod rubygems;
pub mod types;

pub use error::{RepositoryError, Result};
pub use registry::{Registry, RegistryFuture};
pub use rubygems::{RubyGemsClient, RubyGemsConfig, VersionEntry};
pub use types::{
    Candidate, RUBY_PLATFORM, RegistryQuery, matches_request, select_best, source_base,
};
