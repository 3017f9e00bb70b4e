//! Registry result types.

use crate::error::{RepositoryError, Result};
use gemstage_core::{Checksum, GemVersion, VersionConstraint};
use url::Url;

/// The platform string of pure-Ruby gems.
pub const RUBY_PLATFORM: &str = "ruby";

/// One published release of a gem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Gem name.
    pub name: String,
    /// Release version.
    pub version: GemVersion,
    /// Platform (`ruby` for pure-Ruby gems).
    pub platform: String,
    /// Source the release was listed by.
    pub source: Url,
    /// Published SHA-256 of the `.gem` file.
    pub sha256: Option<Checksum>,
}

impl Candidate {
    /// Create a pure-Ruby candidate.
    #[must_use]
    pub fn new(name: impl Into<String>, version: GemVersion, source: Url) -> Self {
        Self {
            name: name.into(),
            version,
            platform: RUBY_PLATFORM.to_string(),
            source,
            sha256: None,
        }
    }

    /// Set the published checksum.
    #[must_use]
    pub const fn with_sha256(mut self, sha256: Checksum) -> Self {
        self.sha256 = Some(sha256);
        self
    }

    /// Whether this is a pure-Ruby release.
    #[must_use]
    pub fn is_ruby_platform(&self) -> bool {
        self.platform == RUBY_PLATFORM
    }

    /// Canonical file name: `<name>-<version>.gem`, with `-<platform>` for
    /// native releases.
    #[must_use]
    pub fn file_name(&self) -> String {
        if self.is_ruby_platform() {
            format!("{}-{}.gem", self.name, self.version)
        } else {
            format!("{}-{}-{}.gem", self.name, self.version, self.platform)
        }
    }

    /// Where the `.gem` file is served: `<source>/gems/<file name>`.
    ///
    /// # Errors
    /// Returns error if the URL cannot be built.
    pub fn download_url(&self) -> Result<Url> {
        let path = format!("gems/{}", self.file_name());
        source_base(&self.source)
            .join(&path)
            .map_err(|e| RepositoryError::InvalidUrl {
                url: format!("{}{path}", self.source),
                message: e.to_string(),
            })
    }
}

/// Ensure a source URL ends with `/` so relative joins append to it.
#[must_use]
pub fn source_base(source: &Url) -> Url {
    let mut base = source.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Outcome of a strict-mode query.
#[derive(Debug, Clone, Default)]
pub struct RegistryQuery {
    /// Candidates from every source that answered.
    pub candidates: Vec<Candidate>,
    /// One entry per source that failed.
    pub errors: Vec<RepositoryError>,
}

impl RegistryQuery {
    /// Render collected errors for diagnostics.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Whether `candidate` satisfies the request.
///
/// Prerelease versions only match when `prerelease` is set.
#[must_use]
pub fn matches_request(
    candidate: &Candidate,
    constraint: &VersionConstraint,
    prerelease: bool,
) -> bool {
    (prerelease || !candidate.version.is_prerelease()) && constraint.matches(&candidate.version)
}

/// Pick the highest version satisfying the request.
///
/// Among equal versions the pure-Ruby release wins, then the first listed.
#[must_use]
pub fn select_best(
    candidates: &[Candidate],
    constraint: &VersionConstraint,
    prerelease: bool,
) -> Option<Candidate> {
    candidates
        .iter()
        .filter(|c| matches_request(c, constraint, prerelease))
        .fold(None::<&Candidate>, |best, c| match best {
            Some(b) if (&b.version, b.is_ruby_platform()) >= (&c.version, c.is_ruby_platform()) => {
                Some(b)
            }
            _ => Some(c),
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Url {
        Url::parse("https://rubygems.org/").unwrap()
    }

    fn candidate(version: &str) -> Candidate {
        Candidate::new("demo", GemVersion::parse(version).unwrap(), source())
    }

    #[test]
    fn file_name_and_url() {
        let c = candidate("1.2.0");
        assert_eq!(c.file_name(), "demo-1.2.0.gem");
        assert_eq!(
            c.download_url().unwrap().as_str(),
            "https://rubygems.org/gems/demo-1.2.0.gem"
        );

        let mut native = candidate("1.2.0");
        native.platform = "x86_64-linux".into();
        assert_eq!(native.file_name(), "demo-1.2.0-x86_64-linux.gem");
    }

    #[test]
    fn url_under_source_path() {
        let mut c = candidate("0.1");
        c.source = Url::parse("https://gems.example.com/private").unwrap();
        assert_eq!(
            c.download_url().unwrap().as_str(),
            "https://gems.example.com/private/gems/demo-0.1.gem"
        );
    }

    #[test]
    fn selects_highest() {
        let candidates = vec![candidate("1.0.0"), candidate("1.2.0"), candidate("1.1.0")];
        let best = select_best(&candidates, &VersionConstraint::any(), false).unwrap();
        assert_eq!(best.version.as_str(), "1.2.0");
    }

    #[test]
    fn respects_constraint() {
        let candidates = vec![candidate("1.0.0"), candidate("2.0.0"), candidate("1.9.3")];
        let constraint = VersionConstraint::parse("~> 1.0").unwrap();
        let best = select_best(&candidates, &constraint, false).unwrap();
        assert_eq!(best.version.as_str(), "1.9.3");

        let constraint = VersionConstraint::parse("> 5").unwrap();
        assert!(select_best(&candidates, &constraint, false).is_none());
    }

    #[test]
    fn prerelease_policy() {
        let candidates = vec![candidate("1.0.0"), candidate("1.1.0.rc1")];
        let any = VersionConstraint::any();
        assert_eq!(
            select_best(&candidates, &any, false).unwrap().version.as_str(),
            "1.0.0"
        );
        assert_eq!(
            select_best(&candidates, &any, true).unwrap().version.as_str(),
            "1.1.0.rc1"
        );
    }

    #[test]
    fn ruby_platform_preferred_on_tie() {
        let mut native = candidate("1.0.0");
        native.platform = "java".into();
        let candidates = vec![native, candidate("1.0.0")];
        let best = select_best(&candidates, &VersionConstraint::any(), false).unwrap();
        assert!(best.is_ruby_platform());
    }

    #[test]
    fn error_summary_joins() {
        let query = RegistryQuery {
            candidates: Vec::new(),
            errors: vec![
                RepositoryError::Timeout { url: "a".into() },
                RepositoryError::Timeout { url: "b".into() },
            ],
        };
        assert_eq!(
            query.error_summary(),
            "request to a timed out; request to b timed out"
        );
    }
}
