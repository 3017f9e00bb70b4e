//! The registry capability consumed by the resolver.

use crate::error::Result;
use crate::types::{Candidate, RegistryQuery};
use gemstage_core::VersionConstraint;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Registry`] methods.
pub type RegistryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of published gem releases.
pub trait Registry: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Releases of `name` satisfying `constraint`, from every source that
    /// answered. Failing sources are skipped.
    ///
    /// # Errors
    /// Returns error only if the query could not be attempted at all.
    fn fetch<'a>(
        &'a self,
        name: &'a str,
        constraint: &'a VersionConstraint,
        prerelease: bool,
    ) -> RegistryFuture<'a, Result<Vec<Candidate>>>;

    /// Like [`fetch`](Self::fetch) but also reports one error per failing
    /// source. Returns `None` when the backend cannot report errors, in
    /// which case callers fall back to `fetch`.
    fn fetch_with_errors<'a>(
        &'a self,
        _name: &'a str,
        _constraint: &'a VersionConstraint,
        _prerelease: bool,
    ) -> RegistryFuture<'a, Option<RegistryQuery>> {
        Box::pin(async { None })
    }
}
