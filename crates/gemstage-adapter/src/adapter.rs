//! The assembled adapter.

use crate::acquire::Resolver;
use crate::archiver::TarGzArchiver;
use crate::installer::GemInstaller;
use crate::normalize;
use crate::plan::InstallLayout;
use crate::stage::{DefaultDirs, Stager};
use gemstage_config::AdapterConfig;
use gemstage_core::{
    ArtifactReference, NormalizedMetadata, PackageNaming, Result, VersionConstraint,
};
use gemstage_downloader::{DownloadOptions, Downloader};
use gemstage_repository::{RubyGemsClient, RubyGemsConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a full conversion produces.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The local `.gem` that was converted.
    pub artifact: ArtifactReference,
    /// Its normalized metadata.
    pub metadata: NormalizedMetadata,
    /// The compressed archive written.
    pub archive: PathBuf,
}

/// RubyGems package-source adapter.
///
/// Each phase takes the previous phase's output explicitly; nothing is
/// updated in place.
#[derive(Debug)]
pub struct GemAdapter {
    resolver: Resolver,
    naming: PackageNaming,
    stager: Stager,
}

impl GemAdapter {
    /// Assemble from parts.
    #[must_use]
    pub const fn new(resolver: Resolver, naming: PackageNaming, stager: Stager) -> Self {
        Self {
            resolver,
            naming,
            stager,
        }
    }

    /// Build the production adapter from configuration. Downloads land in
    /// `working_dir`.
    ///
    /// # Errors
    /// Returns error if an HTTP client cannot be created.
    pub fn from_config(config: &AdapterConfig, working_dir: impl Into<PathBuf>) -> Result<Self> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let read_timeout = Duration::from_secs(config.read_timeout_secs);

        let registry = RubyGemsClient::with_config(RubyGemsConfig {
            sources: config.sources.clone(),
            connect_timeout,
            read_timeout,
            ..RubyGemsConfig::default()
        })?;
        let downloader = Downloader::new(DownloadOptions {
            connect_timeout,
            read_timeout,
            verify_checksum: config.verify_checksums,
            ..DownloadOptions::default()
        })?;
        let resolver = Resolver::new(Arc::new(registry), downloader, working_dir)
            .allow_prerelease(config.allow_prerelease);

        let stager = Stager::new(
            Arc::new(GemInstaller::new(&config.gem_program)),
            Arc::new(TarGzArchiver),
            InstallLayout {
                prefix: config.prefix.clone(),
                bin_override: config.gem_bin_path.clone(),
            },
            DefaultDirs {
                gem_dir: config.gem_dir.clone(),
                bin_dir: config.gem_bindir.clone(),
                ruby_program: Some(config.ruby_program.clone()),
            },
        );

        Ok(Self::new(resolver, PackageNaming::new(&config.suffix), stager))
    }

    /// The orchestrator may recurse over the emitted dependency list.
    #[must_use]
    pub const fn can_recurse_dependencies(&self) -> bool {
        true
    }

    /// Package naming rules.
    #[must_use]
    pub const fn naming(&self) -> &PackageNaming {
        &self.naming
    }

    /// Resolve `identifier` to a local artifact, downloading if needed.
    ///
    /// # Errors
    /// See [`Resolver::acquire`].
    pub async fn acquire(
        &self,
        identifier: &str,
        constraint: Option<&VersionConstraint>,
    ) -> Result<ArtifactReference> {
        self.resolver.acquire(identifier, constraint).await
    }

    /// Read normalized metadata from `artifact`.
    ///
    /// # Errors
    /// Returns [`gemstage_core::Error::UnreadableArchive`] if it cannot be read.
    pub fn extract(&self, artifact: &ArtifactReference) -> Result<NormalizedMetadata> {
        normalize::extract(artifact, &self.naming)
    }

    /// Stage `artifact` and write `<archive_path>.gz`.
    ///
    /// # Errors
    /// See [`Stager::stage_and_archive`].
    pub fn stage_and_archive(
        &self,
        artifact: &ArtifactReference,
        archive_path: &Path,
        build_dir: &Path,
        metadata: &NormalizedMetadata,
    ) -> Result<PathBuf> {
        self.stager
            .stage_and_archive(artifact, archive_path, build_dir, metadata)
    }

    /// Run all three phases.
    ///
    /// # Errors
    /// Returns the first phase failure.
    pub async fn convert(
        &self,
        identifier: &str,
        constraint: Option<&VersionConstraint>,
        archive_path: &Path,
        build_dir: &Path,
    ) -> Result<Conversion> {
        let artifact = self.acquire(identifier, constraint).await?;
        let metadata = self.extract(&artifact)?;
        let archive = self.stage_and_archive(&artifact, archive_path, build_dir, &metadata)?;

        info!(
            package = %metadata.name,
            version = %metadata.version,
            archive = %archive.display(),
            "conversion complete"
        );
        Ok(Conversion {
            artifact,
            metadata,
            archive,
        })
    }
}
