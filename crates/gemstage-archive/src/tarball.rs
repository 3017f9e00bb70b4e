//! Archiving a staged tree into a gzip-compressed tarball.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use gemstage_core::{Error, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Path of the compressed output for `archive`: `<archive>.gz`.
#[must_use]
pub fn compressed_path(archive: &Path) -> PathBuf {
    let mut name = OsString::from(archive.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

/// `preserved` without its root or prefix, so it can be joined under a
/// staging root or used as an archive entry name.
#[must_use]
pub fn relative_preserved(preserved: &Path) -> PathBuf {
    preserved
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Archive each preserved path, read from under `staging_root`, into
/// `<archive>.gz`.
///
/// The tarball is written to a temporary file beside the output and renamed
/// into place, replacing any existing file. On failure nothing is left at
/// the output path.
///
/// # Errors
/// Returns [`Error::ArchiveFailed`] if any entry cannot be added or the
/// output cannot be written.
pub fn write_tar_gz(staging_root: &Path, preserved: &[PathBuf], archive: &Path) -> Result<PathBuf> {
    let output = compressed_path(archive);
    let failed = |message: String| Error::archive_failed(&output, message);

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| failed(e.to_string()))?;
    let temp = NamedTempFile::new_in(&parent).map_err(|e| failed(e.to_string()))?;

    let encoder = GzEncoder::new(BufWriter::new(temp.as_file()), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let mut entries = 0usize;
    for path in preserved {
        let relative = relative_preserved(path);
        let source = staging_root.join(&relative);
        debug!(source = %source.display(), preserved = %path.display(), "archiving");

        for entry in WalkDir::new(&source).sort_by_file_name() {
            let entry = entry.map_err(|e| failed(e.to_string()))?;
            let suffix = entry
                .path()
                .strip_prefix(&source)
                .map_err(|e| failed(e.to_string()))?;
            let name = relative.join(suffix);
            // Preserving `/` makes the staging root itself the top entry.
            if name.as_os_str().is_empty() {
                continue;
            }

            if entry.file_type().is_dir() {
                builder
                    .append_dir(&name, entry.path())
                    .map_err(|e| failed(format!("{}: {e}", entry.path().display())))?;
            } else {
                builder
                    .append_path_with_name(entry.path(), &name)
                    .map_err(|e| failed(format!("{}: {e}", entry.path().display())))?;
            }
            entries += 1;
        }
    }

    let encoder = builder.into_inner().map_err(|e| failed(e.to_string()))?;
    let mut writer = encoder.finish().map_err(|e| failed(e.to_string()))?;
    writer.flush().map_err(|e| failed(e.to_string()))?;
    drop(writer);

    temp.persist(&output).map_err(|e| failed(e.error.to_string()))?;

    info!(output = %output.display(), entries, "archive written");
    Ok(output)
}

/// List the entry names of a `.tar.gz`, directories with a trailing `/`.
///
/// # Errors
/// Returns [`Error::UnreadableArchive`] if the file cannot be read.
pub fn list_tar_gz(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut names = Vec::new();

    for entry in archive.entries().map_err(|e| Error::unreadable(path, e))? {
        let entry = entry.map_err(|e| Error::unreadable(path, e))?;
        let name = entry
            .path()
            .map_err(|e| Error::unreadable(path, e))?
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        if entry.header().entry_type().is_dir() {
            names.push(format!("{name}/"));
        } else {
            names.push(name);
        }
    }

    Ok(names)
}
