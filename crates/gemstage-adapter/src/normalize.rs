//! Projecting a gem specification onto [`NormalizedMetadata`].

use gemstage_archive::{GemPackage, GemSpec};
use gemstage_core::{
    ArtifactReference, CATEGORY, FieldValue, NormalizedMetadata, PackageNaming, Result,
};
use tracing::{debug, warn};

/// Open `artifact` and build its normalized metadata.
///
/// # Errors
/// Returns [`gemstage_core::Error::UnreadableArchive`] if the archive or its
/// specification cannot be read. Individual fields never fail.
pub fn extract(artifact: &ArtifactReference, naming: &PackageNaming) -> Result<NormalizedMetadata> {
    let package = GemPackage::open(artifact.path())?;
    Ok(normalize(package.spec(), naming))
}

/// Build normalized metadata from an already parsed specification.
#[must_use]
pub fn normalize(spec: &GemSpec, naming: &PackageNaming) -> NormalizedMetadata {
    let dependencies = spec
        .dependencies()
        .into_iter()
        .filter(|dep| {
            if !dep.is_runtime() {
                debug!(dependency = %dep.name, kind = ?dep.kind, "skipping non-runtime dependency");
            }
            dep.is_runtime()
        })
        .flat_map(|dep| {
            let package = naming.package_name(&dep.name);
            let clauses = split_requirement(&dep.requirement);
            if clauses.is_empty() {
                vec![package]
            } else {
                clauses
                    .into_iter()
                    .map(|clause| format!("{package} {clause}"))
                    .collect()
            }
        })
        .collect();

    NormalizedMetadata {
        name: naming.package_name(spec.name()),
        version: best_effort("version", spec.version()),
        license: best_effort("license", spec.license()),
        summary: best_effort("summary", spec.summary()),
        description: best_effort("description", spec.description()),
        maintainer: spec.author().into_option(),
        url: spec.homepage().into_option(),
        category: CATEGORY.to_string(),
        executables: spec.executables(),
        dependencies,
    }
}

/// Split a compound requirement into single clauses.
///
/// `">= 1.0, < 2.0"` becomes `[">= 1.0", "< 2.0"]`. Clauses are trimmed and
/// empty ones dropped; they are otherwise passed through untouched.
#[must_use]
pub fn split_requirement(requirement: &str) -> Vec<String> {
    requirement
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn best_effort(field: &str, value: FieldValue<String>) -> String {
    if let FieldValue::Unreadable(ref reason) = value {
        warn!(field, reason = %reason, "unreadable field in gem specification");
    }
    value.or_unknown()
}
