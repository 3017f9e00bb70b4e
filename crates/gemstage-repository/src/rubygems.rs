//! RubyGems.org-compatible registry client.
//!
//! Each configured source is asked for `GET api/v1/versions/<name>.json`,
//! which lists every release of a gem:
//!
//! ```json
//! [{"number": "1.2.0", "platform": "ruby", "prerelease": false, "sha": "..."}]
//! ```
//!
//! A `404` means the source does not know the gem and is not an error.

use crate::error::{RepositoryError, Result};
use crate::registry::{Registry, RegistryFuture};
use crate::types::{Candidate, RegistryQuery, matches_request, source_base};
use gemstage_core::{Checksum, GemVersion, RUBYGEMS_URL, VersionConstraint};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct RubyGemsConfig {
    /// Sources, queried in order.
    pub sources: Vec<Url>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Longest pause between reads.
    pub read_timeout: Duration,
    /// User agent.
    pub user_agent: String,
}

impl Default for RubyGemsConfig {
    fn default() -> Self {
        Self {
            sources: Url::parse(RUBYGEMS_URL).into_iter().collect(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            user_agent: format!("gemstage/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// One entry of the versions endpoint. Unlisted fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    /// Version number.
    pub number: String,
    /// Platform.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Whether RubyGems flags this as a prerelease.
    #[serde(default)]
    pub prerelease: bool,
    /// SHA-256 of the `.gem` file, hex encoded.
    #[serde(default)]
    pub sha: Option<String>,
}

fn default_platform() -> String {
    crate::types::RUBY_PLATFORM.to_string()
}

/// RubyGems registry client.
#[derive(Debug, Clone)]
pub struct RubyGemsClient {
    client: Client,
    config: RubyGemsConfig,
}

impl RubyGemsClient {
    /// Create a client for rubygems.org.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(RubyGemsConfig::default())
    }

    /// Create with custom configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: RubyGemsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| RepositoryError::InvalidConfig {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Configured sources.
    #[must_use]
    pub fn sources(&self) -> &[Url] {
        &self.config.sources
    }

    /// Query every source and collect candidates and per-source errors.
    pub async fn query(
        &self,
        name: &str,
        constraint: &VersionConstraint,
        prerelease: bool,
    ) -> RegistryQuery {
        let mut query = RegistryQuery::default();

        for source in &self.config.sources {
            match self.versions(source, name).await {
                Ok(candidates) => {
                    let before = query.candidates.len();
                    query.candidates.extend(candidates.into_iter().filter(|c| {
                        c.is_ruby_platform() && matches_request(c, constraint, prerelease)
                    }));
                    debug!(
                        source = %source,
                        gem = name,
                        matching = query.candidates.len() - before,
                        "registry answered"
                    );
                }
                Err(e) => {
                    warn!(source = %source, gem = name, error = %e, "registry query failed");
                    query.errors.push(e);
                }
            }
        }

        query
    }

    /// List every release of `name` known to `source`.
    ///
    /// # Errors
    /// Returns error on transport failure, unexpected status or bad JSON.
    pub async fn versions(&self, source: &Url, name: &str) -> Result<Vec<Candidate>> {
        let path = format!("api/v1/versions/{name}.json");
        let url = source_base(source)
            .join(&path)
            .map_err(|e| RepositoryError::InvalidUrl {
                url: format!("{source}{path}"),
                message: e.to_string(),
            })?;

        debug!(url = %url, "fetching gem versions");
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| RepositoryError::from_reqwest(url.as_str(), &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(RepositoryError::Network {
                url: url.to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
                status: Some(status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RepositoryError::from_reqwest(url.as_str(), &e))?;
        let entries: Vec<VersionEntry> =
            sonic_rs::from_str(&body).map_err(|e| RepositoryError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| to_candidate(name, source, entry))
            .collect())
    }
}

fn to_candidate(name: &str, source: &Url, entry: VersionEntry) -> Option<Candidate> {
    let Some(version) = GemVersion::parse(&entry.number) else {
        debug!(gem = name, number = %entry.number, "skipping unparseable version");
        return None;
    };

    Some(Candidate {
        name: name.to_string(),
        version,
        platform: entry.platform,
        source: source.clone(),
        sha256: entry.sha.as_deref().and_then(Checksum::from_hex),
    })
}

impl Registry for RubyGemsClient {
    fn name(&self) -> &str {
        "rubygems"
    }

    fn fetch<'a>(
        &'a self,
        name: &'a str,
        constraint: &'a VersionConstraint,
        prerelease: bool,
    ) -> RegistryFuture<'a, Result<Vec<Candidate>>> {
        Box::pin(async move { Ok(self.query(name, constraint, prerelease).await.candidates) })
    }

    fn fetch_with_errors<'a>(
        &'a self,
        name: &'a str,
        constraint: &'a VersionConstraint,
        prerelease: bool,
    ) -> RegistryFuture<'a, Option<RegistryQuery>> {
        Box::pin(async move { Some(self.query(name, constraint, prerelease).await) })
    }
}
