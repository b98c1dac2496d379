//! Ability: compiled decision object
//!
//! Built once from granted permissions and queried many times.
//!
//! # Architecture
//!
//! ```text
//! granted items → flatten → partition by type → PermissionMatcher per permission
//!                                               ↓
//! requested → expand subject × action → cannot matchers → can matchers → bool
//! ```

pub mod config;
pub mod matcher;

pub use config::{AbilityConfig, GLOBAL_ACTION, GLOBAL_SUBJECT};
pub use matcher::PermissionMatcher;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::conditions::ConditionEvaluator;
use crate::error::Result;
use crate::permission::{IntoNames, Permission, PermissionItem, PermissionType};
use crate::transform::{flatten_permissions, FlattenOptions};

/// Decision object answering `test`/`has` queries against granted permissions
///
/// Immutable after construction; share it freely across threads.
///
/// # Examples
///
/// ```
/// use cretoai_ability::{can, cannot, Ability};
///
/// let ability = Ability::new(["user:read", "user:create", "!user:delete"]).unwrap();
///
/// assert!(ability.test(&can("read", "user"), None));
/// assert!(!ability.test(&can("delete", "user"), None));
/// assert!(ability.test(&cannot("delete", "user"), None));
/// assert!(ability.has(["user:read", "user:create"], None).unwrap());
/// ```
pub struct Ability {
    permissions: Vec<Permission>,
    can_matchers: Vec<PermissionMatcher>,
    cannot_matchers: Vec<PermissionMatcher>,
    config: AbilityConfig,
}

impl Ability {
    /// Build an ability with the default configuration
    ///
    /// # Errors
    /// Fails when a granted permission string does not decode.
    pub fn new<I, T>(granted: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        Self::with_config(granted, AbilityConfig::default())
    }

    /// Build an ability with a custom configuration
    pub fn with_config<I, T>(granted: I, config: AbilityConfig) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        let items: Vec<PermissionItem> = granted.into_iter().map(Into::into).collect();
        let permissions = flatten_permissions(&items, &FlattenOptions::default())?;
        let evaluator = Arc::new(ConditionEvaluator::new());

        let (cannot, can): (Vec<_>, Vec<_>) = permissions
            .iter()
            .cloned()
            .partition(Permission::is_cannot);

        let compile = |list: Vec<Permission>| -> Vec<PermissionMatcher> {
            list.into_iter()
                .map(|p| PermissionMatcher::new(p, &config, Arc::clone(&evaluator)))
                .collect()
        };
        let can_matchers = compile(can);
        let cannot_matchers = compile(cannot);

        debug!(
            "Ability initialized with {} permissions (can={}, cannot={})",
            permissions.len(),
            can_matchers.len(),
            cannot_matchers.len()
        );

        Ok(Self {
            permissions,
            can_matchers,
            cannot_matchers,
            config,
        })
    }

    /// The flattened granted permissions
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// The configuration this ability was built with
    pub fn config(&self) -> &AbilityConfig {
        &self.config
    }

    /// Evaluate one requested permission
    ///
    /// Subject and action lists expand into every combination and all of
    /// them must pass. A `can` request passes when no `cannot` grant covers
    /// it and some `can` grant does. A `cannot` request is the exact
    /// negation: it passes when a `cannot` grant covers it or no `can`
    /// grant does. A request with no subject or no action never passes.
    pub fn test(&self, requested: &Permission, context: Option<&Value>) -> bool {
        let expanded = requested.expand();
        let result = !expanded.is_empty()
            && expanded
                .iter()
                .all(|single| self.test_single(single, context));

        trace!(permission = %requested, result, "ability test");
        result
    }

    /// Every requested permission must pass; an empty request is `true`
    ///
    /// Accepts permissions, groups and permission strings; groups are
    /// flattened first.
    ///
    /// # Errors
    /// Fails when a requested permission string does not decode.
    pub fn has<I, T>(&self, requested: I, context: Option<&Value>) -> Result<bool>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        Ok(self
            .requested(requested)?
            .iter()
            .all(|p| self.test(p, context)))
    }

    /// Alias for [`has`](Self::has)
    pub fn has_all<I, T>(&self, requested: I, context: Option<&Value>) -> Result<bool>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        self.has(requested, context)
    }

    /// At least one requested permission must pass; an empty request is `false`
    pub fn has_any<I, T>(&self, requested: I, context: Option<&Value>) -> Result<bool>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        Ok(self
            .requested(requested)?
            .iter()
            .any(|p| self.test(p, context)))
    }

    /// Shorthand for testing `can(action, subject)`
    pub fn can(&self, action: impl IntoNames, subject: impl IntoNames) -> bool {
        self.test(&crate::permission::can(action, subject), None)
    }

    /// Shorthand for testing `cannot(action, subject)`
    pub fn cannot(&self, action: impl IntoNames, subject: impl IntoNames) -> bool {
        self.test(&crate::permission::cannot(action, subject), None)
    }

    fn requested<I, T>(&self, requested: I) -> Result<Vec<Permission>>
    where
        I: IntoIterator<Item = T>,
        T: Into<PermissionItem>,
    {
        let items: Vec<PermissionItem> = requested.into_iter().map(Into::into).collect();
        flatten_permissions(&items, &FlattenOptions::default())
    }

    fn test_single(&self, requested: &Permission, context: Option<&Value>) -> bool {
        let denied = self
            .cannot_matchers
            .iter()
            .any(|m| m.covers(requested, context));

        let allowed = !denied
            && self
                .can_matchers
                .iter()
                .any(|m| m.covers(requested, context));

        match requested.kind {
            PermissionType::Can => allowed,
            PermissionType::Cannot => !allowed,
        }
    }
}

/// Build an [`Ability`] from granted permissions
pub fn create_ability<I, T>(granted: I) -> Result<Ability>
where
    I: IntoIterator<Item = T>,
    T: Into<PermissionItem>,
{
    Ability::new(granted)
}
