//! Archive handling for gemstage.
//!
//! - [`gem`]: open a `.gem` and read its YAML specification
//! - [`tarball`]: archive staged directories into `<archive>.gz`

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod gem;
pub mod tarball;

pub use gem::{DependencyKind, GemDependency, GemPackage, GemSpec};
pub use tarball::{compressed_path, list_tar_gz, relative_preserved, write_tar_gz};
