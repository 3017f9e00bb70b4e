//! Reading `.gem` archives.
//!
//! A `.gem` file is a plain tar holding `metadata.gz` (the gzipped YAML gem
//! specification), `data.tar.gz` and `checksums.yaml.gz`. Only the
//! specification is read here. Its YAML carries Ruby object tags such as
//! `!ruby/object:Gem::Specification`; they are stripped so the document can
//! be walked as plain mappings.

use flate2::read::GzDecoder;
use gemstage_core::{Error, FieldValue, Result};
use serde_yaml::{Mapping, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Kind of a declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyKind {
    /// `:runtime`, or no type given.
    Runtime,
    /// `:development`.
    Development,
    /// Anything else.
    Other(String),
}

impl DependencyKind {
    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str).map(|s| s.trim_start_matches(':')) {
            None | Some("runtime") => Self::Runtime,
            Some("development") => Self::Development,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// A dependency declared by a gem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemDependency {
    /// Dependency name.
    pub name: String,
    /// Requirement rendered the way RubyGems prints it, e.g. `>= 1.0, < 2.0`.
    pub requirement: String,
    /// Runtime or development.
    pub kind: DependencyKind,
}

impl GemDependency {
    /// Whether the dependency is needed at runtime.
    #[must_use]
    pub fn is_runtime(&self) -> bool {
        self.kind == DependencyKind::Runtime
    }
}

/// The parsed gem specification.
///
/// Accessors are best effort: a field that is missing reads as
/// [`FieldValue::Absent`] and one with an unexpected shape as
/// [`FieldValue::Unreadable`].
#[derive(Debug, Clone)]
pub struct GemSpec {
    name: String,
    root: Mapping,
}

impl GemSpec {
    /// Parse a YAML gem specification.
    ///
    /// # Errors
    /// Returns a message if the document is not YAML, is not a mapping or
    /// has no `name`.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, String> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
        let Value::Mapping(root) = strip_tags(value) else {
            return Err("specification is not a mapping".to_string());
        };

        let name = match scalar(root.get("name"), "name") {
            FieldValue::Present(name) if !name.is_empty() => name,
            _ => return Err("specification has no name".to_string()),
        };

        Ok(Self { name, root })
    }

    /// Gem name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version number.
    #[must_use]
    pub fn version(&self) -> FieldValue<String> {
        match self.root.get("version") {
            Some(Value::Mapping(m)) => scalar(m.get("version"), "version"),
            other => scalar(other, "version"),
        }
    }

    /// First entry of `licenses`, falling back to `license`.
    #[must_use]
    pub fn license(&self) -> FieldValue<String> {
        match first_of(self.root.get("licenses"), "licenses") {
            FieldValue::Absent => scalar(self.root.get("license"), "license"),
            found => found,
        }
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> FieldValue<String> {
        scalar(self.root.get("summary"), "summary")
    }

    /// Long description.
    #[must_use]
    pub fn description(&self) -> FieldValue<String> {
        scalar(self.root.get("description"), "description")
    }

    /// First entry of `authors`, falling back to `author`.
    #[must_use]
    pub fn author(&self) -> FieldValue<String> {
        match first_of(self.root.get("authors"), "authors") {
            FieldValue::Absent => scalar(self.root.get("author"), "author"),
            found => found,
        }
    }

    /// Project homepage.
    #[must_use]
    pub fn homepage(&self) -> FieldValue<String> {
        scalar(self.root.get("homepage"), "homepage")
    }

    /// Executable names, verbatim.
    #[must_use]
    pub fn executables(&self) -> Vec<String> {
        strings(self.root.get("executables"))
    }

    /// Every declared dependency, runtime and development.
    ///
    /// Entries without a name are skipped.
    #[must_use]
    pub fn dependencies(&self) -> Vec<GemDependency> {
        let Some(Value::Sequence(deps)) = self.root.get("dependencies") else {
            return Vec::new();
        };

        deps.iter()
            .filter_map(|dep| {
                let Value::Mapping(dep) = dep else {
                    return None;
                };
                let Some(name) = dep.get("name").and_then(Value::as_str) else {
                    debug!("skipping dependency without a name");
                    return None;
                };
                let requirement = dep
                    .get("requirement")
                    .or_else(|| dep.get("version_requirements"))
                    .map(render_requirement)
                    .unwrap_or_default();

                Some(GemDependency {
                    name: name.to_string(),
                    requirement,
                    kind: DependencyKind::parse(dep.get("type")),
                })
            })
            .collect()
    }
}

/// An opened `.gem` archive.
#[derive(Debug, Clone)]
pub struct GemPackage {
    spec: GemSpec,
}

impl GemPackage {
    /// Open a `.gem` file and parse its specification.
    ///
    /// # Errors
    /// Returns [`Error::UnreadableArchive`] if the file is not a tar, has no
    /// `metadata.gz`/`metadata` entry, or the specification cannot be parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        let yaml = read_metadata(file).map_err(|e| Error::unreadable(path, e))?;
        let spec = GemSpec::from_yaml(&yaml).map_err(|e| Error::unreadable(path, e))?;

        debug!(path = %path.display(), gem = spec.name(), "read gem specification");
        Ok(Self { spec })
    }

    /// The gem specification.
    #[must_use]
    pub const fn spec(&self) -> &GemSpec {
        &self.spec
    }
}

fn read_metadata<R: Read>(reader: R) -> std::result::Result<String, String> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(|e| e.to_string())?;

    for entry in entries {
        let mut entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path().map_err(|e| e.to_string())?.into_owned();
        let mut yaml = String::new();

        if path == Path::new("metadata.gz") {
            GzDecoder::new(&mut entry)
                .read_to_string(&mut yaml)
                .map_err(|e| format!("metadata.gz: {e}"))?;
            return Ok(yaml);
        }
        if path == Path::new("metadata") {
            entry
                .read_to_string(&mut yaml)
                .map_err(|e| format!("metadata: {e}"))?;
            return Ok(yaml);
        }
    }

    Err("no metadata entry in archive".to_string())
}

/// Remove YAML tags recursively.
fn strip_tags(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => strip_tags(tagged.value),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(strip_tags).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (strip_tags(k), strip_tags(v)))
                .collect(),
        ),
        other => other,
    }
}

fn scalar(value: Option<&Value>, key: &str) -> FieldValue<String> {
    match value {
        None | Some(Value::Null) => FieldValue::Absent,
        Some(Value::String(s)) => FieldValue::Present(s.clone()),
        Some(Value::Number(n)) => FieldValue::Present(n.to_string()),
        Some(Value::Bool(b)) => FieldValue::Present(b.to_string()),
        Some(_) => FieldValue::Unreadable(format!("{key} is not a scalar")),
    }
}

fn first_of(value: Option<&Value>, key: &str) -> FieldValue<String> {
    match value {
        Some(Value::Sequence(seq)) => seq
            .first()
            .map_or(FieldValue::Absent, |v| scalar(Some(v), key)),
        other => scalar(other, key),
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| scalar(Some(v), "entry").into_option())
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Render a `Gem::Requirement` as RubyGems prints it: `"<op> <version>"`
/// clauses joined with `", "`.
fn render_requirement(requirement: &Value) -> String {
    let clauses = match requirement {
        Value::Mapping(m) => m.get("requirements"),
        Value::Sequence(_) => Some(requirement),
        Value::String(s) => return s.clone(),
        _ => None,
    };
    let Some(Value::Sequence(clauses)) = clauses else {
        return String::new();
    };

    clauses
        .iter()
        .filter_map(|clause| {
            let Value::Sequence(pair) = clause else {
                return None;
            };
            let op = pair.first().and_then(Value::as_str)?;
            let version = match pair.get(1)? {
                Value::Mapping(v) => scalar(v.get("version"), "version"),
                other => scalar(Some(other), "version"),
            }
            .into_option()?;
            Some(format!("{op} {version}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
