//! Staging layout.
//!
//! Where the installer writes and which install-relative paths the archive
//! preserves. Computed without touching the filesystem.

use gemstage_archive::relative_preserved;
use gemstage_core::{Error, Result};
use gemstage_platform::RubyEnvironment;
use std::path::{Path, PathBuf};

/// Configured install locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallLayout {
    /// Install root override.
    pub prefix: Option<PathBuf>,
    /// Binaries directory override.
    pub bin_override: Option<PathBuf>,
}

/// A directory created under the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDir {
    /// Location under the staging root.
    pub staging_path: PathBuf,
    /// Install-relative path it represents in the archive.
    pub preserved_path: PathBuf,
}

impl StagedDir {
    fn under(root: &Path, preserved: &Path) -> Self {
        Self {
            staging_path: root.join(relative_preserved(preserved)),
            preserved_path: preserved.to_path_buf(),
        }
    }
}

/// Ordered staging directories: install prefix first, then the binaries
/// directory when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    root: PathBuf,
    install_dir: StagedDir,
    bin_dir: Option<StagedDir>,
}

impl StagingPlan {
    /// Staging root for an archive: `<build_dir>/<archive file name>.dir`.
    #[must_use]
    pub fn staging_root(build_dir: &Path, archive_path: &Path) -> PathBuf {
        let name = archive_path
            .file_name()
            .map_or_else(|| "archive".into(), |n| n.to_string_lossy().into_owned());
        build_dir.join(format!("{name}.dir"))
    }

    /// Decide the layout.
    ///
    /// | executables | bin override | prefix override | binaries dir          |
    /// |-------------|--------------|-----------------|-----------------------|
    /// | no          | any          | any             | none                  |
    /// | yes         | set          | any             | bin override          |
    /// | yes         | unset        | set             | none                  |
    /// | yes         | unset        | unset           | `Gem.bindir` default  |
    #[must_use]
    pub fn compute(
        root: &Path,
        layout: &InstallLayout,
        defaults: &RubyEnvironment,
        has_executables: bool,
    ) -> Self {
        let prefix = layout
            .prefix
            .as_deref()
            .unwrap_or_else(|| defaults.gem_dir());

        let bin_dir = if !has_executables {
            None
        } else if let Some(bin) = layout.bin_override.as_deref() {
            Some(bin)
        } else if layout.prefix.is_some() {
            None
        } else {
            Some(defaults.bin_dir())
        };

        Self {
            root: root.to_path_buf(),
            install_dir: StagedDir::under(root, prefix),
            bin_dir: bin_dir.map(|bin| StagedDir::under(root, bin)),
        }
    }

    /// The staging root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The install prefix.
    #[must_use]
    pub const fn install_dir(&self) -> &StagedDir {
        &self.install_dir
    }

    /// The binaries directory, if staged.
    #[must_use]
    pub const fn bin_dir(&self) -> Option<&StagedDir> {
        self.bin_dir.as_ref()
    }

    /// Every staged directory in order.
    pub fn dirs(&self) -> impl Iterator<Item = &StagedDir> {
        std::iter::once(&self.install_dir).chain(self.bin_dir.as_ref())
    }

    /// Preserved paths in order.
    #[must_use]
    pub fn preserved_paths(&self) -> Vec<PathBuf> {
        self.dirs().map(|d| d.preserved_path.clone()).collect()
    }

    /// Create every staging directory. Existing directories are fine.
    ///
    /// # Errors
    /// Returns error if a directory cannot be created.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(&dir.staging_path)
                .map_err(|e| Error::io(&dir.staging_path, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RubyEnvironment {
        RubyEnvironment::new("/usr/lib/ruby/gems/3.2.0", "/usr/bin")
    }

    fn root() -> PathBuf {
        PathBuf::from("/build/out.tar.dir")
    }

    #[test]
    fn staging_root_from_archive_name() {
        assert_eq!(
            StagingPlan::staging_root(Path::new("/build"), Path::new("/out/demo.tar")),
            PathBuf::from("/build/demo.tar.dir")
        );
    }

    #[test]
    fn defaults_with_executables() {
        let plan = StagingPlan::compute(&root(), &InstallLayout::default(), &defaults(), true);

        assert_eq!(
            plan.install_dir().staging_path,
            PathBuf::from("/build/out.tar.dir/usr/lib/ruby/gems/3.2.0")
        );
        assert_eq!(
            plan.preserved_paths(),
            vec![PathBuf::from("/usr/lib/ruby/gems/3.2.0"), PathBuf::from("/usr/bin")]
        );
        assert_eq!(
            plan.bin_dir().unwrap().staging_path,
            PathBuf::from("/build/out.tar.dir/usr/bin")
        );
    }

    #[test]
    fn no_executables_no_bindir() {
        let layout = InstallLayout {
            prefix: None,
            bin_override: Some("/opt/bin".into()),
        };
        let plan = StagingPlan::compute(&root(), &layout, &defaults(), false);
        assert!(plan.bin_dir().is_none());
        assert_eq!(plan.dirs().count(), 1);
    }

    #[test]
    fn prefix_without_bin_override_has_no_bindir() {
        let layout = InstallLayout {
            prefix: Some("/opt/gems".into()),
            bin_override: None,
        };
        let plan = StagingPlan::compute(&root(), &layout, &defaults(), true);

        assert_eq!(plan.preserved_paths(), vec![PathBuf::from("/opt/gems")]);
        assert_eq!(
            plan.install_dir().staging_path,
            PathBuf::from("/build/out.tar.dir/opt/gems")
        );
    }

    #[test]
    fn bin_override_wins() {
        let layout = InstallLayout {
            prefix: Some("/opt/gems".into()),
            bin_override: Some("/opt/bin".into()),
        };
        let plan = StagingPlan::compute(&root(), &layout, &defaults(), true);
        assert_eq!(
            plan.preserved_paths(),
            vec![PathBuf::from("/opt/gems"), PathBuf::from("/opt/bin")]
        );

        let layout = InstallLayout {
            prefix: None,
            bin_override: Some("/usr/local/bin".into()),
        };
        let plan = StagingPlan::compute(&root(), &layout, &defaults(), true);
        assert_eq!(
            plan.bin_dir().unwrap().preserved_path,
            PathBuf::from("/usr/local/bin")
        );
    }

    #[test]
    fn create_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let plan = StagingPlan::compute(dir.path(), &InstallLayout::default(), &defaults(), true);

        plan.create_dirs().unwrap();
        plan.create_dirs().unwrap();
        assert!(plan.dirs().all(|d| d.staging_path.is_dir()));
    }
}
