//! Permission data model

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conditions::Conditions;
use crate::error::Result;
use crate::scope::{Scope, ScopeResult, ScopeSource};

/// Whether a permission grants or denies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    /// Grant the action
    #[default]
    Can,
    /// Deny the action
    Cannot,
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Can => f.write_str("can"),
            Self::Cannot => f.write_str("cannot"),
        }
    }
}

/// A grant or denial of actions on subjects
///
/// `subject` and `action` hold one or more names. On a granted permission a
/// list applies uniformly to every entry; on a requested permission every
/// subject/action combination must be satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Subject names (e.g. "user", "role")
    #[serde(with = "one_or_many")]
    pub subject: Vec<String>,

    /// Action names (e.g. "read", "delete")
    #[serde(with = "one_or_many")]
    pub action: Vec<String>,

    /// Grant or denial, `can` when absent
    #[serde(rename = "type", default)]
    pub kind: PermissionType,

    /// Optional condition query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Optional scope restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Permission {
    /// Create a `can` permission for the given subject(s) and action(s)
    pub fn new(subject: impl IntoNames, action: impl IntoNames) -> Self {
        Self {
            subject: subject.into_names(),
            action: action.into_names(),
            kind: PermissionType::Can,
            conditions: None,
            scope: None,
        }
    }

    /// Turn this permission into a denial
    pub fn denied(mut self) -> Self {
        self.kind = PermissionType::Cannot;
        self
    }

    /// Attach a condition query
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Attach a condition query from a JSON object
    ///
    /// Non-object values are ignored.
    pub fn when(self, conditions: Value) -> Self {
        match conditions {
            Value::Object(map) => self.with_conditions(map),
            _ => self,
        }
    }

    /// Restrict to an already parsed scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Restrict to a scope given in any supported encoding
    pub fn in_scope<S: ScopeSource + ?Sized>(self, scope: &S) -> ScopeResult<Self> {
        Ok(self.with_scope(scope.to_scope()?))
    }

    /// Whether this permission denies
    pub fn is_cannot(&self) -> bool {
        self.kind == PermissionType::Cannot
    }

    /// Expand into one permission per subject/action pair
    pub fn expand(&self) -> Vec<Permission> {
        let mut expanded = Vec::with_capacity(self.subject.len() * self.action.len());
        for subject in &self.subject {
            for action in &self.action {
                expanded.push(Permission {
                    subject: vec![subject.clone()],
                    action: vec![action.clone()],
                    ..self.clone()
                });
            }
        }
        expanded
    }
}

/// Container whose scope and conditions are inherited by every nested entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionGroup {
    /// Nested permissions and groups
    pub permissions: Vec<PermissionItem>,

    /// Conditions merged into every nested permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Scope prefixed onto every nested permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl PermissionGroup {
    /// Create a group from items
    pub fn new(permissions: Vec<PermissionItem>) -> Self {
        Self {
            permissions,
            ..Self::default()
        }
    }

    /// Attach inherited conditions
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Attach an inherited scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Attach an inherited scope given in any supported encoding
    pub fn in_scope<S: ScopeSource + ?Sized>(self, scope: &S) -> ScopeResult<Self> {
        Ok(self.with_scope(scope.to_scope()?))
    }
}

/// A permission, a group, or a permission string awaiting decoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionItem {
    /// DSL text, see [`parse_permission_string`](crate::parse_permission_string)
    Encoded(String),
    /// Nested group
    Group(PermissionGroup),
    /// Single permission
    Leaf(Permission),
}

impl PermissionItem {
    /// Decode `Encoded` items; other variants are returned unchanged
    pub fn decode(self) -> Result<Self> {
        match self {
            Self::Encoded(text) => Ok(Self::Leaf(text.parse()?)),
            other => Ok(other),
        }
    }

    /// Whether this item is a single permission
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Whether this item is a group
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl From<Permission> for PermissionItem {
    fn from(permission: Permission) -> Self {
        Self::Leaf(permission)
    }
}

impl From<PermissionGroup> for PermissionItem {
    fn from(group: PermissionGroup) -> Self {
        Self::Group(group)
    }
}

impl From<&str> for PermissionItem {
    fn from(text: &str) -> Self {
        Self::Encoded(text.to_string())
    }
}

impl From<String> for PermissionItem {
    fn from(text: String) -> Self {
        Self::Encoded(text)
    }
}

/// Whether a JSON value has the shape of a single permission
pub fn is_permission(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("subject") && obj.contains_key("action"))
}

/// Whether a JSON value has the shape of a permission group
pub fn is_permission_group(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get("permissions"))
        .is_some_and(Value::is_array)
}

/// One or more subject/action names
pub trait IntoNames {
    /// Convert into an owned list of names
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

impl IntoNames for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl<const N: usize> IntoNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

/// Create a `can` permission (`can("read", "user")`)
pub fn can(action: impl IntoNames, subject: impl IntoNames) -> Permission {
    Permission::new(subject, action)
}

/// Create a `cannot` permission (`cannot("delete", "user")`)
pub fn cannot(action: impl IntoNames, subject: impl IntoNames) -> Permission {
    Permission::new(subject, action).denied()
}

/// Create a `can` permission, subject first (`permission("user", "read")`)
pub fn permission(subject: impl IntoNames, action: impl IntoNames) -> Permission {
    Permission::new(subject, action)
}

/// Serde helper writing single-element lists as a scalar
mod one_or_many {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(names: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match names {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(name) => Ok(vec![name]),
            OneOrMany::Many(names) if names.is_empty() => {
                Err(de::Error::invalid_length(0, &"at least one name"))
            }
            OneOrMany::Many(names) => Ok(names),
        }
    }
}
