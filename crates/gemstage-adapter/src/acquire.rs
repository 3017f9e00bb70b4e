//! Artifact acquisition: resolve a gem name against the registry and
//! download the best match.

use gemstage_core::{ArtifactReference, Error, Identifier, Result, VersionConstraint};
use gemstage_downloader::Downloader;
use gemstage_repository::{Registry, select_best};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Shown in [`Error::NotFound`] when no constraint was given.
const ANY_VERSION: &str = "any";

/// Resolves identifiers to local `.gem` files.
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<dyn Registry>,
    downloader: Downloader,
    download_dir: PathBuf,
    allow_prerelease: bool,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry.name())
            .field("download_dir", &self.download_dir)
            .field("allow_prerelease", &self.allow_prerelease)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver that downloads into `download_dir`.
    #[must_use]
    pub fn new(
        registry: Arc<dyn Registry>,
        downloader: Downloader,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            downloader,
            download_dir: download_dir.into(),
            allow_prerelease: false,
        }
    }

    /// Consider prerelease versions even when the constraint does not name one.
    #[must_use]
    pub const fn allow_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = allow;
        self
    }

    /// Turn `identifier` into a local artifact.
    ///
    /// An existing file is returned as is without touching the network.
    /// Otherwise the identifier must be a bare gem name; the highest release
    /// satisfying `constraint` (latest when `None`) is downloaded into the
    /// download directory as `<name>-<version>.gem`.
    ///
    /// # Errors
    /// - [`Error::InvalidIdentifier`] before any query when the input is
    ///   neither a file nor a bare name
    /// - [`Error::NotFound`] when no release matches
    /// - [`Error::Registry`] or [`Error::ChecksumMismatch`] when the
    ///   query or download fails
    pub async fn acquire(
        &self,
        identifier: &str,
        constraint: Option<&VersionConstraint>,
    ) -> Result<ArtifactReference> {
        let name = match Identifier::classify(identifier)? {
            Identifier::LocalFile(reference) => {
                debug!(artifact = %reference, "using local file");
                return Ok(reference);
            }
            Identifier::BareName(name) => name,
        };

        let requested = constraint.cloned().unwrap_or_default();
        let prerelease = self.allow_prerelease || requested.is_prerelease();

        let (candidates, diagnostics) = match self
            .registry
            .fetch_with_errors(&name, &requested, prerelease)
            .await
        {
            Some(query) => {
                let summary = if query.errors.is_empty() {
                    "none".to_string()
                } else {
                    query.error_summary()
                };
                (query.candidates, summary)
            }
            None => {
                debug!(registry = self.registry.name(), "registry does not report errors");
                let candidates = self
                    .registry
                    .fetch(&name, &requested, prerelease)
                    .await
                    .map_err(Error::from)?;
                (candidates, "unavailable".to_string())
            }
        };

        let Some(best) = select_best(&candidates, &requested, prerelease) else {
            return Err(Error::NotFound {
                identifier: name,
                constraint: constraint.map_or_else(|| ANY_VERSION.to_string(), ToString::to_string),
                errors: diagnostics,
            });
        };

        let url = best.download_url().map_err(Error::from)?;
        let dest = self.download_dir.join(best.file_name());
        info!(gem = %best.name, version = %best.version, url = %url, "downloading gem");

        let result = self
            .downloader
            .download(&url, &dest, best.sha256.as_ref())
            .await?;

        Ok(ArtifactReference::new(result.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemstage_core::{Checksum, GemVersion};
    use gemstage_repository::{Candidate, RegistryFuture, RegistryQuery, RepositoryError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakeRegistry {
        candidates: Vec<Candidate>,
        errors: Vec<RepositoryError>,
        strict: bool,
        calls: AtomicUsize,
    }

    impl FakeRegistry {
        fn new(candidates: Vec<Candidate>) -> Self {
            Self {
                candidates,
                errors: Vec::new(),
                strict: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Registry for FakeRegistry {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch<'a>(
            &'a self,
            _name: &'a str,
            _constraint: &'a VersionConstraint,
            _prerelease: bool,
        ) -> RegistryFuture<'a, gemstage_repository::Result<Vec<Candidate>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(self.candidates.clone()) })
        }

        fn fetch_with_errors<'a>(
            &'a self,
            _name: &'a str,
            _constraint: &'a VersionConstraint,
            _prerelease: bool,
        ) -> RegistryFuture<'a, Option<RegistryQuery>> {
            if !self.strict {
                return Box::pin(async { None });
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Some(RegistryQuery {
                    candidates: self.candidates.clone(),
                    errors: self.errors.clone(),
                })
            })
        }
    }

    fn candidate(source: &Url, version: &str) -> Candidate {
        Candidate::new("demo", GemVersion::parse(version).unwrap(), source.clone())
    }

    fn resolver(registry: Arc<FakeRegistry>, dir: &std::path::Path) -> Resolver {
        Resolver::new(registry, Downloader::with_defaults().unwrap(), dir)
    }

    #[tokio::test]
    async fn local_file_skips_registry() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("demo-1.0.gem");
        std::fs::write(&local, b"gem").unwrap();
        let registry = Arc::new(FakeRegistry::new(Vec::new()));

        let artifact = resolver(registry.clone(), dir.path())
            .acquire(local.to_str().unwrap(), None)
            .await
            .unwrap();

        assert_eq!(artifact.path(), local);
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_identifier_before_query() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(FakeRegistry::new(Vec::new()));

        let err = resolver(registry.clone(), dir.path())
            .acquire("not/a gem", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidIdentifier { .. }));
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn no_candidates_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FakeRegistry::new(Vec::new());
        registry.errors = vec![RepositoryError::Timeout {
            url: "https://mirror.example/".into(),
        }];
        let constraint = VersionConstraint::parse("~> 9.0").unwrap();

        let err = resolver(Arc::new(registry), dir.path())
            .acquire("demo", Some(&constraint))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(message.contains("name: demo"));
        assert!(message.contains("version: ~> 9.0"));
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn lenient_registry_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FakeRegistry::new(Vec::new());
        registry.strict = false;

        let err = resolver(Arc::new(registry), dir.path())
            .acquire("demo", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("version: any, errors: unavailable"));
    }

    #[tokio::test]
    async fn downloads_highest_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gems/demo-1.2.0.gem"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"gem bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        let source = Url::parse(&server.uri()).unwrap();

        let registry = Arc::new(FakeRegistry::new(vec![
            candidate(&source, "1.0.0"),
            candidate(&source, "1.2.0").with_sha256(Checksum::from_bytes(b"gem bytes")),
            candidate(&source, "1.1.0"),
        ]));
        let dir = tempfile::tempdir().unwrap();

        let artifact = resolver(registry, dir.path())
            .acquire("demo", None)
            .await
            .unwrap();

        assert_eq!(artifact.path(), dir.path().join("demo-1.2.0.gem"));
        assert!(artifact.is_local_file());
    }

    #[tokio::test]
    async fn checksum_mismatch_leaves_no_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;
        let source = Url::parse(&server.uri()).unwrap();
        let registry = Arc::new(FakeRegistry::new(vec![
            candidate(&source, "1.0.0").with_sha256(Checksum::from_bytes(b"original")),
        ]));
        let dir = tempfile::tempdir().unwrap();

        let err = resolver(registry, dir.path())
            .acquire("demo", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChecksumMismatch { .. }));
        assert!(!dir.path().join("demo-1.0.0.gem").exists());
    }
}
