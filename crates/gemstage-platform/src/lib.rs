//! Platform utilities for gemstage.
//!
//! - [`ProcessBuilder`] for running the external `gem` and `ruby` binaries
//! - [`RubyEnvironment`] for discovering the default gem and binary directories

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod process;
pub mod ruby;

pub use error::{PlatformError, Result};
pub use process::{ProcessBuilder, ProcessOutput};
pub use ruby::{DEFAULT_GEM_BINDIR, DEFAULT_GEM_DIR, RubyEnvironment};
