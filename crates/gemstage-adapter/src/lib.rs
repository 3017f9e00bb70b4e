//! RubyGems package-source adapter.
//!
//! Turns a gem name or a local `.gem` file into normalized package metadata
//! and a compressed tarball of its installed files, in three phases:
//!
//! 1. [`acquire`]: resolve a name against the registry and download the best
//!    matching version, or pass a local file through.
//! 2. [`normalize`]: read the gem specification and map it onto
//!    [`NormalizedMetadata`](gemstage_core::NormalizedMetadata).
//! 3. [`stage`]: install the gem into a throwaway staging root laid out by
//!    [`plan`] and archive the preserved directories.
//!
//! [`GemAdapter`] wires the phases together from an
//! [`AdapterConfig`](gemstage_config::AdapterConfig).
//!
//! # Example
//!
//! ```no_run
//! use gemstage_adapter::GemAdapter;
//! use gemstage_config::AdapterConfig;
//! use std::path::Path;
//!
//! # async fn run() -> gemstage_core::Result<()> {
//! let adapter = GemAdapter::from_config(&AdapterConfig::default(), "/tmp/gems")?;
//! let conversion = adapter
//!     .convert("rack", None, Path::new("/tmp/out/data.tar"), Path::new("/tmp/build"))
//!     .await?;
//! println!("{}", conversion.archive.display());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod acquire;
pub mod adapter;
pub mod archiver;
pub mod installer;
pub mod normalize;
pub mod plan;
pub mod stage;

pub use acquire::Resolver;
pub use adapter::{Conversion, GemAdapter};
pub use archiver::{Archiver, TarGzArchiver};
pub use installer::{GemInstaller, Installer};
pub use normalize::{extract, normalize, split_requirement};
pub use plan::{InstallLayout, StagedDir, StagingPlan};
pub use stage::{DefaultDirs, Stager};
