//! Per-permission match predicate

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::config::AbilityConfig;
use crate::conditions::{is_subset, ConditionEvaluator};
use crate::permission::Permission;
use crate::scope::create_scope_regex;

/// How a stored scope restricts requests
#[derive(Debug)]
enum ScopeCheck {
    /// No restriction
    Any,
    /// Requested scope text must match the left-anchored pattern
    Pattern(Regex),
    /// Pattern could not be built; scoped requests never match
    Unmatchable,
}

/// Match predicate compiled from one granted permission
pub struct PermissionMatcher {
    permission: Permission,
    scope_check: ScopeCheck,
    any_action: bool,
    any_subject: bool,
    evaluator: Arc<ConditionEvaluator>,
}

impl PermissionMatcher {
    /// Compile a granted permission
    pub fn new(
        permission: Permission,
        config: &AbilityConfig,
        evaluator: Arc<ConditionEvaluator>,
    ) -> Self {
        let scope_check = match permission.scope.as_ref().filter(|s| !s.is_global()) {
            None => ScopeCheck::Any,
            Some(scope) => match create_scope_regex(scope) {
                Ok(regex) => ScopeCheck::Pattern(regex),
                Err(e) => {
                    warn!(scope = %scope, error = %e, "scope pattern rejected");
                    ScopeCheck::Unmatchable
                }
            },
        };

        let any_action = permission.action.contains(&config.global_action);
        let any_subject = permission.subject.contains(&config.global_subject);

        Self {
            permission,
            scope_check,
            any_action,
            any_subject,
            evaluator,
        }
    }

    /// The granted permission this matcher was built from
    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    /// Whether the granted permission covers `requested`, ignoring type
    ///
    /// All of the following must hold:
    /// - the requested scope (when present) matches the granted scope pattern
    /// - every requested action is granted, or the global action is granted
    /// - every requested subject is granted, or the global subject is granted
    /// - `context` (when present) satisfies the granted conditions
    /// - requested conditions are a subset of the granted conditions
    pub fn covers(&self, requested: &Permission, context: Option<&Value>) -> bool {
        self.scope_matches(requested)
            && (self.any_action || contains_all(&self.permission.action, &requested.action))
            && (self.any_subject || contains_all(&self.permission.subject, &requested.subject))
            && self.context_matches(context)
            && self.conditions_compatible(requested)
    }

    /// Type-aware predicate
    ///
    /// Equal to [`covers`](Self::covers) when the granted and requested
    /// types agree, its negation otherwise.
    pub fn test(&self, requested: &Permission, context: Option<&Value>) -> bool {
        let covered = self.covers(requested, context);
        if self.permission.kind == requested.kind {
            covered
        } else {
            !covered
        }
    }

    fn scope_matches(&self, requested: &Permission) -> bool {
        let Some(scope) = &requested.scope else {
            return true;
        };

        match &self.scope_check {
            ScopeCheck::Any => true,
            ScopeCheck::Pattern(regex) => regex.is_match(&scope.to_string()),
            ScopeCheck::Unmatchable => false,
        }
    }

    fn context_matches(&self, context: Option<&Value>) -> bool {
        let (Some(conditions), Some(context)) = (&self.permission.conditions, context) else {
            return true;
        };

        match self.evaluator.matches(conditions, context) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(permission = %self.permission, error = %e, "condition evaluation failed");
                false
            }
        }
    }

    fn conditions_compatible(&self, requested: &Permission) -> bool {
        match (&self.permission.conditions, &requested.conditions) {
            (Some(stored), Some(wanted)) => is_subset(wanted, stored),
            _ => true,
        }
    }
}

fn contains_all(granted: &[String], requested: &[String]) -> bool {
    requested.iter().all(|name| granted.contains(name))
}
