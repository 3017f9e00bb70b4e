//! Staging and archiving.

use crate::archiver::Archiver;
use crate::installer::Installer;
use crate::plan::{InstallLayout, StagingPlan};
use gemstage_core::{ArtifactReference, Error, NormalizedMetadata, Result};
use gemstage_platform::RubyEnvironment;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Where ecosystem defaults come from.
#[derive(Debug, Clone, Default)]
pub struct DefaultDirs {
    /// `Gem.dir` override.
    pub gem_dir: Option<PathBuf>,
    /// `Gem.bindir` override.
    pub bin_dir: Option<PathBuf>,
    /// Ruby used to probe whatever is not overridden.
    pub ruby_program: Option<PathBuf>,
}

/// Installs a gem into a temporary root and archives the result.
pub struct Stager {
    installer: Arc<dyn Installer>,
    archiver: Arc<dyn Archiver>,
    layout: InstallLayout,
    default_dirs: DefaultDirs,
    defaults: OnceLock<RubyEnvironment>,
}

impl std::fmt::Debug for Stager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stager")
            .field("layout", &self.layout)
            .field("default_dirs", &self.default_dirs)
            .finish_non_exhaustive()
    }
}

impl Stager {
    /// Create a stager.
    #[must_use]
    pub fn new(
        installer: Arc<dyn Installer>,
        archiver: Arc<dyn Archiver>,
        layout: InstallLayout,
        default_dirs: DefaultDirs,
    ) -> Self {
        Self {
            installer,
            archiver,
            layout,
            default_dirs,
            defaults: OnceLock::new(),
        }
    }

    /// Use fixed ecosystem defaults instead of probing Ruby.
    #[must_use]
    pub fn with_defaults(mut self, defaults: RubyEnvironment) -> Self {
        self.defaults = OnceLock::from(defaults);
        self
    }

    /// Configured install layout.
    #[must_use]
    pub const fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Ecosystem defaults: configured directories, else probed from Ruby on
    /// first use, else built-in fallbacks.
    pub fn defaults(&self) -> &RubyEnvironment {
        self.defaults.get_or_init(|| {
            let dirs = &self.default_dirs;
            if let (Some(gem_dir), Some(bin_dir)) = (&dirs.gem_dir, &dirs.bin_dir) {
                return RubyEnvironment::new(gem_dir, bin_dir);
            }
            let probed = dirs
                .ruby_program
                .as_deref()
                .map_or_else(RubyEnvironment::default, RubyEnvironment::probe);
            RubyEnvironment::new(
                dirs.gem_dir.as_deref().unwrap_or_else(|| probed.gem_dir()),
                dirs.bin_dir.as_deref().unwrap_or_else(|| probed.bin_dir()),
            )
        })
    }

    /// Plan the staging layout for `archive_path` inside `build_dir`.
    #[must_use]
    pub fn plan(
        &self,
        archive_path: &Path,
        build_dir: &Path,
        metadata: &NormalizedMetadata,
    ) -> StagingPlan {
        let root = StagingPlan::staging_root(build_dir, archive_path);
        StagingPlan::compute(&root, &self.layout, self.defaults(), metadata.has_executables())
    }

    /// Install `artifact` into a fresh staging root and archive it to
    /// `<archive_path>.gz`.
    ///
    /// The staging root is removed afterwards whether or not the run
    /// succeeded; a failed removal is only logged.
    ///
    /// # Errors
    /// Returns [`Error::InstallFailed`] or [`Error::ArchiveFailed`], or
    /// [`Error::Io`] if the staging directories cannot be created.
    pub fn stage_and_archive(
        &self,
        artifact: &ArtifactReference,
        archive_path: &Path,
        build_dir: &Path,
        metadata: &NormalizedMetadata,
    ) -> Result<PathBuf> {
        let plan = self.plan(archive_path, build_dir, metadata);
        let root = plan.root();

        if root.exists() {
            debug!(root = %root.display(), "removing stale staging root");
            std::fs::remove_dir_all(root).map_err(|e| Error::io(root, e))?;
        }

        let result = self.run(artifact, archive_path, &plan);

        if let Err(e) = std::fs::remove_dir_all(root)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(root = %root.display(), error = %e, "failed to remove staging root");
        }

        result
    }

    fn run(
        &self,
        artifact: &ArtifactReference,
        archive_path: &Path,
        plan: &StagingPlan,
    ) -> Result<PathBuf> {
        plan.create_dirs()?;

        self.installer.install(
            artifact.path(),
            &plan.install_dir().staging_path,
            plan.bin_dir().map(|d| d.staging_path.as_path()),
        )?;

        let output = self
            .archiver
            .archive(plan.root(), &plan.preserved_paths(), archive_path)?;

        info!(
            artifact = %artifact,
            archive = %output.display(),
            preserved = ?plan.preserved_paths(),
            "staged and archived"
        );
        Ok(output)
    }
}
