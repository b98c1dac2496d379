/// Scope type definitions and parsing
///
/// Provides the canonical `Scope` representation (alternating type/id
/// pairs) and normalization from the three accepted input encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Segment delimiter used by the textual scope encoding
pub const SCOPE_DELIMITER: char = ':';

/// Wildcard matching any single type or id
pub const SCOPE_WILDCARD: &str = "*";

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Errors that can occur during scope operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Malformed segment layout (e.g. a leading or internal empty type)
    #[error("Invalid scope format: {0}")]
    InvalidFormat(String),

    /// Requested scope key is not present in the scope
    #[error("Scope key '{key}' not found in scope '{scope}'")]
    MissingKey {
        /// Requested type
        key: String,
        /// Scope that was searched
        scope: String,
    },

    /// Scope value is neither a string, a string array nor a subject array
    #[error("Unsupported scope type: {0}")]
    UnsupportedType(String),

    /// Scope could not be turned into a match pattern
    #[error("Pattern matching error: {0}")]
    PatternError(String),
}

/// One `{type, id?}` segment of a scope path
///
/// An absent `id` means "type only", e.g. a top-level namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeSubject {
    /// Segment type (e.g. "org", "app")
    #[serde(rename = "type")]
    pub kind: String,

    /// Segment id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ScopeSubject {
    /// Create a segment with both type and id
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    /// Create a type-only segment
    pub fn kind_only(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    fn normalized(&self) -> ScopeResult<Self> {
        let kind = normalize(&self.kind);
        if kind.is_empty() {
            return Err(ScopeError::InvalidFormat(
                "scope subject has an empty type".to_string(),
            ));
        }

        let id = self
            .id
            .as_deref()
            .map(normalize)
            .filter(|id| !id.is_empty());

        Ok(Self { kind, id })
    }
}

/// Represents a hierarchical scope as an ordered sequence of subjects
///
/// A scope may be written as a colon-separated string
/// (`org:123:app:456`), a flat string array or a subject array; all three
/// normalize to the same value. The empty scope is the global namespace.
///
/// # Examples
///
/// ```
/// use cretoai_ability::scope::Scope;
///
/// let scope: Scope = "Org:123:app: 456".parse().unwrap();
/// assert_eq!(scope.len(), 2);
/// assert_eq!(scope.to_string(), "org:123:app:456");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    subjects: Vec<ScopeSubject>,
}

impl Scope {
    /// The empty (global) scope
    pub fn global() -> Self {
        Self::default()
    }

    /// Parse a colon-delimited scope string
    ///
    /// Empty or whitespace-only input yields the global scope.
    pub fn new(s: &str) -> ScopeResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::global());
        }

        let segments: Vec<&str> = s.split(SCOPE_DELIMITER).collect();
        Self::from_segments(&segments)
    }

    /// Build a scope from a flat `[type, id, type, id, ...]` list
    ///
    /// An empty id denotes a type-only segment and an odd trailing type
    /// has no id. Empty types are rejected.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> ScopeResult<Self> {
        let mut subjects = Vec::with_capacity(segments.len().div_ceil(2));

        for (idx, pair) in segments.chunks(2).enumerate() {
            let kind = normalize(pair[0].as_ref());
            if kind.is_empty() {
                let position = if idx == 0 { "leading" } else { "internal" };
                return Err(ScopeError::InvalidFormat(format!(
                    "{} empty type segment at position {}",
                    position,
                    idx * 2
                )));
            }

            let id = pair
                .get(1)
                .map(|id| normalize(id.as_ref()))
                .filter(|id| !id.is_empty());

            subjects.push(ScopeSubject { kind, id });
        }

        Ok(Self { subjects })
    }

    /// Build a scope from subject values, normalizing each one
    pub fn from_subjects(subjects: &[ScopeSubject]) -> ScopeResult<Self> {
        let subjects = subjects
            .iter()
            .map(ScopeSubject::normalized)
            .collect::<ScopeResult<Vec<_>>>()?;

        Ok(Self { subjects })
    }

    /// Parse a scope from a loosely typed JSON value
    ///
    /// Accepts a string, an array of strings, an array of subject objects or
    /// `null` (global). Anything else is `UnsupportedType`.
    pub fn from_value(value: &Value) -> ScopeResult<Self> {
        match value {
            Value::Null => Ok(Self::global()),
            Value::String(s) => Self::new(s),
            Value::Array(items) if items.is_empty() => Ok(Self::global()),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                let segments: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                Self::from_segments(&segments)
            }
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let subjects = items
                    .iter()
                    .map(|item| {
                        ScopeSubject::deserialize(item)
                            .map_err(|e| ScopeError::UnsupportedType(e.to_string()))
                    })
                    .collect::<ScopeResult<Vec<_>>>()?;
                Self::from_subjects(&subjects)
            }
            other => Err(ScopeError::UnsupportedType(other.to_string())),
        }
    }

    /// Returns the subjects of this scope
    pub fn subjects(&self) -> &[ScopeSubject] {
        &self.subjects
    }

    /// Iterate over the subjects of this scope
    pub fn iter(&self) -> std::slice::Iter<'_, ScopeSubject> {
        self.subjects.iter()
    }

    /// Number of subjects (type/id pairs)
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether the scope has no subjects
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Whether this is the global (unscoped) namespace
    pub fn is_global(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Returns the scope without its last subject, if any
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.subjects.split_last()?;
        Some(Self {
            subjects: rest.to_vec(),
        })
    }

    /// Returns a new scope with `child` appended after this one
    pub fn join(&self, child: &Scope) -> Self {
        let mut subjects = self.subjects.clone();
        subjects.extend(child.subjects.iter().cloned());
        Self { subjects }
    }

    /// Checks if this scope covers `other`
    ///
    /// True when this scope is no longer than `other` and every subject
    /// matches position by position. A `*` type matches any type; a `*` or
    /// absent id matches any id. Equal scopes cover each other.
    pub fn is_parent_of(&self, other: &Scope) -> bool {
        if self.subjects.len() > other.subjects.len() {
            return false;
        }

        self.subjects
            .iter()
            .zip(other.subjects.iter())
            .all(|(parent, child)| {
                let kind_matches = parent.kind == SCOPE_WILDCARD || parent.kind == child.kind;
                let id_matches = match &parent.id {
                    None => true,
                    Some(id) if id == SCOPE_WILDCARD => true,
                    Some(id) => child.id.as_ref() == Some(id),
                };
                kind_matches && id_matches
            })
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for subject in &self.subjects {
            let parts = std::iter::once(subject.kind.as_str()).chain(subject.id.as_deref());
            for part in parts {
                if !first {
                    write!(f, "{}", SCOPE_DELIMITER)?;
                }
                f.write_str(part)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Scope {
    type Item = &'a ScopeSubject;
    type IntoIter = std::slice::Iter<'a, ScopeSubject>;

    fn into_iter(self) -> Self::IntoIter {
        self.subjects.iter()
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Scope::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Anything that can be normalized into a [`Scope`]
///
/// Implemented for the string, flat string list and subject list encodings.
pub trait ScopeSource {
    /// Parse into the canonical representation
    fn to_scope(&self) -> ScopeResult<Scope>;

    /// The scope as written, for encodings that are already text
    fn raw_text(&self) -> Option<&str> {
        None
    }
}

impl ScopeSource for Scope {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Ok(self.clone())
    }
}

impl ScopeSource for str {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::new(self)
    }

    fn raw_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl ScopeSource for String {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::new(self)
    }

    fn raw_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl ScopeSource for [String] {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_segments(self)
    }
}

impl ScopeSource for Vec<String> {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_segments(self)
    }
}

impl ScopeSource for [&str] {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_segments(self)
    }
}

impl ScopeSource for Vec<&str> {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_segments(self)
    }
}

impl<const N: usize> ScopeSource for [&str; N] {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_segments(self)
    }
}

impl ScopeSource for [ScopeSubject] {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_subjects(self)
    }
}

impl ScopeSource for Vec<ScopeSubject> {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_subjects(self)
    }
}

impl ScopeSource for Value {
    fn to_scope(&self) -> ScopeResult<Scope> {
        Scope::from_value(self)
    }

    fn raw_text(&self) -> Option<&str> {
        self.as_str()
    }
}

impl<T: ScopeSource> ScopeSource for Option<T> {
    fn to_scope(&self) -> ScopeResult<Scope> {
        match self {
            Some(scope) => scope.to_scope(),
            None => Ok(Scope::global()),
        }
    }

    fn raw_text(&self) -> Option<&str> {
        self.as_ref().and_then(ScopeSource::raw_text)
    }
}

impl<T: ScopeSource + ?Sized> ScopeSource for &T {
    fn to_scope(&self) -> ScopeResult<Scope> {
        (**self).to_scope()
    }

    fn raw_text(&self) -> Option<&str> {
        (**self).raw_text()
    }
}

fn normalize(segment: &str) -> String {
    segment.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_creation() {
        let scope = Scope::new("org:123:app:456").unwrap();
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.subjects()[0], ScopeSubject::new("org", "123"));
        assert_eq!(scope.subjects()[1], ScopeSubject::new("app", "456"));
    }

    #[test]
    fn test_empty_scope_is_global() {
        assert!(Scope::new("").unwrap().is_global());
        assert!(Scope::new("   ").unwrap().is_global());
    }

    #[test]
    fn test_trailing_type_without_id() {
        let scope = Scope::new("org:123:app").unwrap();
        assert_eq!(scope.subjects()[1], ScopeSubject::kind_only("app"));
    }

    #[test]
    fn test_empty_id_is_type_only() {
        let scope = Scope::from_segments(&["org", "", "app", "1"]).unwrap();
        assert_eq!(scope.subjects()[0], ScopeSubject::kind_only("org"));
        assert_eq!(scope.to_string(), "org:app:1");
    }

    #[test]
    fn test_leading_empty_segment() {
        let result = Scope::from_segments(&["", "123"]);
        assert!(matches!(result, Err(ScopeError::InvalidFormat(_))));
    }

    #[test]
    fn test_internal_empty_type() {
        let result = Scope::new("org:1::2");
        assert!(matches!(result, Err(ScopeError::InvalidFormat(_))));
    }

    #[test]
    fn test_normalization() {
        let scope = Scope::new(" ORG : Acme ").unwrap();
        assert_eq!(scope.to_string(), "org:acme");
    }

    #[test]
    fn test_from_value() {
        let from_str = Scope::from_value(&json!("org:1")).unwrap();
        let from_list = Scope::from_value(&json!(["org", "1"])).unwrap();
        let from_subjects = Scope::from_value(&json!([{ "type": "org", "id": "1" }])).unwrap();

        assert_eq!(from_str, from_list);
        assert_eq!(from_list, from_subjects);
    }

    #[test]
    fn test_unsupported_value() {
        assert!(matches!(
            Scope::from_value(&json!(42)),
            Err(ScopeError::UnsupportedType(_))
        ));
        assert!(matches!(
            Scope::from_value(&json!(["org", 1])),
            Err(ScopeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_parent() {
        let scope = Scope::new("org:1:app:2").unwrap();
        let parent = scope.parent().unwrap();
        assert_eq!(parent.to_string(), "org:1");
        assert!(parent.parent().unwrap().is_global());
        assert!(Scope::global().parent().is_none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let scope = Scope::new("org:1:app:2").unwrap();
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json, json!("org:1:app:2"));

        let back: Scope = serde_json::from_value(json).unwrap();
        assert_eq!(back, scope);
    }
}
