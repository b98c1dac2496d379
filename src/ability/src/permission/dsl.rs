//! Permission string encoding
//!
//! ```text
//! permission-string := "!"? scope-prefix? subject-list ":" action-list condition-block?
//! ```
//!
//! Examples: `user:read`, `!org:123:user:delete`,
//! `org:*:app:456:role:assign,unassign`, `user:read{orgId:123,active:true}`.
//! A leading `:` denotes an explicitly empty (global) scope.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::literal;
use super::types::{Permission, PermissionType};
use crate::error::{AuthzError, Result};
use crate::scope::{Scope, SCOPE_DELIMITER};

const NEGATION: char = '!';
const LIST_SEPARATOR: char = ',';

/// Decode a permission string
///
/// # Errors
/// `InvalidPermissionFormat` when the subject or action segment is missing
/// or empty, `InvalidConditions` when the condition block does not parse,
/// and scope errors for malformed scope prefixes.
///
/// # Examples
///
/// ```
/// use cretoai_ability::{parse_permission_string, PermissionType};
///
/// let p = parse_permission_string("!org:123:user,role:read").unwrap();
/// assert_eq!(p.kind, PermissionType::Cannot);
/// assert_eq!(p.subject, vec!["user", "role"]);
/// assert_eq!(p.scope.unwrap().to_string(), "org:123");
/// ```
pub fn parse_permission_string(text: &str) -> Result<Permission> {
    let trimmed = text.trim();

    let (kind, rest) = match trimmed.strip_prefix(NEGATION) {
        Some(rest) => (PermissionType::Cannot, rest),
        None => (PermissionType::Can, trimmed),
    };

    let (body, conditions) = match rest.find(&['{', '}'][..]) {
        Some(idx) => {
            let block = &rest[idx..];
            (&rest[..idx], Some(parse_conditions(block, text)?))
        }
        None => (rest, None),
    };

    let mut tokens: Vec<&str> = body.split(SCOPE_DELIMITER).collect();
    if tokens.len() < 2 {
        return Err(AuthzError::InvalidPermissionFormat(format!(
            "'{}' needs at least a subject and an action",
            text
        )));
    }

    let actions = names(tokens.pop().unwrap_or_default(), "action", text)?;
    let subjects = names(tokens.pop().unwrap_or_default(), "subject", text)?;
    let scope = if tokens.is_empty() {
        None
    } else {
        Some(Scope::new(&tokens.join(":"))?)
    };

    Ok(Permission {
        subject: subjects,
        action: actions,
        kind,
        conditions,
        scope,
    })
}

/// Encode a permission as a string
///
/// Global scopes are omitted, so decoding the result yields no scope.
pub fn stringify_permission(permission: &Permission) -> String {
    permission.to_string()
}

fn names(segment: &str, what: &str, text: &str) -> Result<Vec<String>> {
    let names: Vec<String> = segment
        .split(LIST_SEPARATOR)
        .map(|name| name.trim().to_string())
        .collect();

    if names.iter().any(String::is_empty) {
        return Err(AuthzError::InvalidPermissionFormat(format!(
            "empty {} in '{}'",
            what, text
        )));
    }

    Ok(names)
}

fn parse_conditions(block: &str, text: &str) -> Result<serde_json::Map<String, Value>> {
    let invalid = || AuthzError::InvalidConditions {
        fragment: block.to_string(),
        permission: text.to_string(),
    };

    match literal::parse(block) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid()),
        Err(e) => {
            tracing::debug!(error = %e, "condition block rejected");
            Err(invalid())
        }
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        parse_permission_string(s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == PermissionType::Cannot {
            write!(f, "{}", NEGATION)?;
        }

        // A global scope renders as a bare leading delimiter
        if let Some(scope) = &self.scope {
            write!(f, "{}{}", scope, SCOPE_DELIMITER)?;
        }

        write!(
            f,
            "{}{}{}",
            self.subject.join(","),
            SCOPE_DELIMITER,
            self.action.join(",")
        )?;

        if let Some(conditions) = &self.conditions {
            f.write_str(&literal::to_string(&Value::Object(conditions.clone())))?;
        }

        Ok(())
    }
}
