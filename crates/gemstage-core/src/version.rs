//! Version and requirement handling (RubyGems-compatible).

use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// One version segment. String segments sort before numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Segment {
    Str(String),
    Num(u64),
}

static ZERO: Segment = Segment::Num(0);

/// A gem version such as `1.2.3`, `2.0` or `1.0.0.rc1`.
#[derive(Debug, Clone)]
pub struct GemVersion {
    raw: String,
    segments: Vec<Segment>,
}

impl GemVersion {
    /// Parse a version string.
    ///
    /// Dashes are treated as `.pre.`, the way RubyGems reads them.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return None;
        }

        let normalized = trimmed.replace('-', ".pre.");
        let mut segments = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return None;
            }
            let bytes = part.as_bytes();
            let mut start = 0;
            for i in 1..=bytes.len() {
                if i == bytes.len() || bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit() {
                    let run = &part[start..i];
                    if bytes[start].is_ascii_digit() {
                        segments.push(Segment::Num(run.parse().ok()?));
                    } else {
                        segments.push(Segment::Str(run.to_string()));
                    }
                    start = i;
                }
            }
        }

        Some(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Get the version as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether any segment contains letters.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Str(_)))
    }

    /// Numeric segments before the first prerelease marker.
    #[must_use]
    pub fn release(&self) -> Self {
        let numbers: Vec<u64> = self
            .segments
            .iter()
            .map_while(|s| match s {
                Segment::Num(n) => Some(*n),
                Segment::Str(_) => None,
            })
            .collect();
        Self::from_numbers(&numbers)
    }

    /// Upper bound used by `~>`: drop the last release segment and increment
    /// the one before it (`1.2.3` -> `1.3`, `1.2` -> `2`).
    #[must_use]
    pub fn bump(&self) -> Self {
        let mut numbers: Vec<u64> = self
            .release()
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Num(n) => Some(*n),
                Segment::Str(_) => None,
            })
            .collect();
        if numbers.len() > 1 {
            numbers.pop();
        }
        match numbers.last_mut() {
            Some(last) => *last += 1,
            None => numbers.push(1),
        }
        Self::from_numbers(&numbers)
    }

    fn from_numbers(numbers: &[u64]) -> Self {
        let raw = numbers
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            segments: numbers.iter().copied().map(Segment::Num).collect(),
        }
    }

    /// Segments with trailing zeros removed from each release/prerelease run,
    /// so that `1.0` and `1.0.0` compare equal.
    fn canonical(&self) -> Vec<Segment> {
        let mut out = Vec::with_capacity(self.segments.len());
        let mut group: Vec<Segment> = Vec::new();
        for segment in &self.segments {
            if matches!(segment, Segment::Str(_)) {
                flush_group(&mut group, &mut out);
            }
            group.push(segment.clone());
        }
        flush_group(&mut group, &mut out);
        out
    }
}

fn flush_group(group: &mut Vec<Segment>, out: &mut Vec<Segment>) {
    while group.last() == Some(&ZERO) {
        group.pop();
    }
    out.append(group);
}

impl Ord for GemVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.canonical();
        let rhs = other.canonical();
        for i in 0..lhs.len().max(rhs.len()) {
            let a = lhs.get(i).unwrap_or(&ZERO);
            let b = rhs.get(i).unwrap_or(&ZERO);
            match a.cmp(b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for GemVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GemVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GemVersion {}

impl Hash for GemVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for GemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for GemVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidConstraint {
            constraint: s.to_string(),
            reason: "malformed version number".into(),
        })
    }
}

/// Requirement operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `~>`
    Pessimistic,
}

impl Operator {
    /// Longest operators first so `>=` is not read as `>`.
    const TOKENS: [(&'static str, Self); 7] = [
        ("~>", Self::Pessimistic),
        (">=", Self::Ge),
        ("<=", Self::Le),
        ("!=", Self::Ne),
        ("=", Self::Eq),
        (">", Self::Gt),
        ("<", Self::Lt),
    ];

    /// Get the operator token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Pessimistic => "~>",
        }
    }

    /// Check `version <op> bound`.
    #[must_use]
    pub fn satisfied_by(self, version: &GemVersion, bound: &GemVersion) -> bool {
        match self {
            Self::Eq => version == bound,
            Self::Ne => version != bound,
            Self::Gt => version > bound,
            Self::Lt => version < bound,
            Self::Ge => version >= bound,
            Self::Le => version <= bound,
            Self::Pessimistic => version >= bound && version.release() < bound.bump(),
        }
    }

    fn split(clause: &str) -> (Self, &str) {
        for (token, op) in Self::TOKENS {
            if let Some(rest) = clause.strip_prefix(token) {
                return (op, rest);
            }
        }
        (Self::Eq, clause)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A RubyGems requirement: one or more comma-separated clauses, all of which
/// must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    clauses: Vec<(Operator, GemVersion)>,
}

impl VersionConstraint {
    /// Parse a requirement such as `~> 1.2` or `>= 1.0, < 2.0`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConstraint`] if any clause is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidConstraint {
            constraint: s.to_string(),
            reason: reason.to_string(),
        };

        let mut clauses = Vec::new();
        for clause in s.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                return Err(invalid("empty requirement clause"));
            }
            let (op, rest) = Operator::split(clause);
            let version =
                GemVersion::parse(rest).ok_or_else(|| invalid("malformed version number"))?;
            clauses.push((op, version));
        }

        Ok(Self {
            raw: s.trim().to_string(),
            clauses,
        })
    }

    /// Requirement matching every version.
    #[must_use]
    pub fn any() -> Self {
        Self {
            raw: ">= 0".to_string(),
            clauses: vec![(Operator::Ge, GemVersion::from_numbers(&[0]))],
        }
    }

    /// Get raw constraint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed clauses in declaration order.
    #[must_use]
    pub fn clauses(&self) -> &[(Operator, GemVersion)] {
        &self.clauses
    }

    /// Check if version matches every clause.
    #[must_use]
    pub fn matches(&self, version: &GemVersion) -> bool {
        self.clauses
            .iter()
            .all(|(op, bound)| op.satisfied_by(version, bound))
    }

    /// Whether the requirement itself names a prerelease, which opts the
    /// query into prerelease candidates.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.clauses.iter().any(|(_, v)| v.is_prerelease())
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GemVersion {
        GemVersion::parse(s).unwrap()
    }

    #[test]
    fn ordering() {
        assert!(v("1.0.0") < v("1.2.0"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.0.0.rc1") < v("1.0.0"));
        assert!(v("1.0.a") < v("1.0.b"));
        assert!(v("2") > v("1.99.99"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn max_of_unsorted() {
        let versions = [v("1.0.0"), v("1.2.0"), v("1.1.0")];
        assert_eq!(versions.iter().max().unwrap().as_str(), "1.2.0");
    }

    #[test]
    fn prerelease_detection() {
        assert!(v("1.0.0.beta2").is_prerelease());
        assert!(v("1.0.0-rc1").is_prerelease());
        assert!(!v("1.0.0").is_prerelease());
    }

    #[test]
    fn malformed_versions() {
        assert!(GemVersion::parse("").is_none());
        assert!(GemVersion::parse("abc").is_none());
        assert!(GemVersion::parse("1..2").is_none());
        assert!(GemVersion::parse("1.0 beta").is_none());
    }

    #[test]
    fn bump() {
        assert_eq!(v("1.2.3").bump().as_str(), "1.3");
        assert_eq!(v("1.2").bump().as_str(), "2");
        assert_eq!(v("1").bump().as_str(), "2");
        assert_eq!(v("1.2.0.rc1").bump().as_str(), "1.3");
    }

    #[test]
    fn pessimistic() {
        let c = VersionConstraint::parse("~> 1.2").unwrap();
        assert!(c.matches(&v("1.2.0")));
        assert!(c.matches(&v("1.9.9")));
        assert!(!c.matches(&v("2.0")));
        assert!(!c.matches(&v("1.1")));

        let c = VersionConstraint::parse("~> 1.2.3").unwrap();
        assert!(c.matches(&v("1.2.9")));
        assert!(!c.matches(&v("1.3.0")));
    }

    #[test]
    fn compound_range() {
        let c = VersionConstraint::parse(">= 1.0, < 2.0").unwrap();
        assert_eq!(c.clauses().len(), 2);
        assert!(c.matches(&v("1.5")));
        assert!(!c.matches(&v("2.0")));
        assert!(!c.matches(&v("0.9")));
    }

    #[test]
    fn bare_version_is_exact() {
        let c = VersionConstraint::parse("1.4.2").unwrap();
        assert_eq!(c.clauses()[0].0, Operator::Eq);
        assert!(c.matches(&v("1.4.2")));
        assert!(!c.matches(&v("1.4.3")));
    }

    #[test]
    fn any_matches_everything() {
        assert!(VersionConstraint::any().matches(&v("0.0.1")));
        assert!(VersionConstraint::default().matches(&v("99")));
        assert_eq!(VersionConstraint::default().as_str(), ">= 0");
    }

    #[test]
    fn invalid_constraints() {
        assert!(VersionConstraint::parse("").is_err());
        assert!(VersionConstraint::parse(">= ").is_err());
        assert!(VersionConstraint::parse(">= 1.0,").is_err());
        assert!(VersionConstraint::parse("=> 1.0").is_err());
    }

    #[test]
    fn prerelease_constraint() {
        assert!(VersionConstraint::parse("= 2.0.0.beta1").unwrap().is_prerelease());
        assert!(!VersionConstraint::parse("~> 2.0").unwrap().is_prerelease());
    }
}
