//! The archiver capability.

use gemstage_core::Result;
use std::path::{Path, PathBuf};

/// Packs staged directories into the final compressed archive.
pub trait Archiver: Send + Sync {
    /// Archive each preserved path, read from under `staging_root`, and
    /// compress the result next to `archive_path`. Returns the path written.
    ///
    /// # Errors
    /// Returns [`gemstage_core::Error::ArchiveFailed`] on failure, leaving
    /// no output behind.
    fn archive(&self, staging_root: &Path, preserved: &[PathBuf], archive_path: &Path)
    -> Result<PathBuf>;
}

/// Writes `<archive_path>.gz` as a gzip-compressed tarball.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzArchiver;

impl Archiver for TarGzArchiver {
    fn archive(
        &self,
        staging_root: &Path,
        preserved: &[PathBuf],
        archive_path: &Path,
    ) -> Result<PathBuf> {
        gemstage_archive::write_tar_gz(staging_root, preserved, archive_path)
    }
}
