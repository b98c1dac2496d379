//! Flatten/group transformations
//!
//! [`flatten_permissions`] expands nested groups into a flat list,
//! pushing each group's scope and conditions down onto its leaves.
//! [`group_permissions`] goes the other way and collects permissions that
//! share scope and conditions into groups.

mod flatten;
mod group;

pub use flatten::flatten_permissions;
pub use group::{group_permissions, GroupOptions};

use crate::conditions::{merge_conditions, Conditions};
use crate::permission::Permission;
use crate::scope::Scope;

/// Uniform adjustments applied to a permission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyOptions {
    /// Scope placed in front of the permission's own scope
    pub scope_prefix: Option<Scope>,

    /// Conditions the permission's own conditions are merged onto
    pub additional_conditions: Option<Conditions>,
}

/// Options for [`flatten_permissions`], applied once to every result
pub type FlattenOptions = ModifyOptions;

impl ModifyOptions {
    /// Options that change nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scope prefix
    pub fn with_scope_prefix(mut self, scope: Scope) -> Self {
        self.scope_prefix = Some(scope);
        self
    }

    /// Set the additional conditions
    pub fn with_additional_conditions(mut self, conditions: Conditions) -> Self {
        self.additional_conditions = Some(conditions);
        self
    }

    fn is_noop(&self) -> bool {
        self.scope_prefix.is_none() && self.additional_conditions.is_none()
    }
}

/// Apply a scope prefix and additional conditions to a permission
///
/// The prefix goes before the permission's scope. The permission's own
/// conditions override the additional ones key by key.
pub fn modify_permission(permission: &Permission, options: &ModifyOptions) -> Permission {
    inherit(
        permission.clone(),
        options.scope_prefix.as_ref(),
        options.additional_conditions.as_ref(),
    )
}

/// Push an ancestor's scope and conditions onto `permission`
pub(crate) fn inherit(
    mut permission: Permission,
    scope: Option<&Scope>,
    conditions: Option<&Conditions>,
) -> Permission {
    permission.scope = join_scope(scope, permission.scope.as_ref());
    permission.conditions = join_conditions(conditions, permission.conditions.as_ref());
    permission
}

pub(crate) fn join_scope(parent: Option<&Scope>, child: Option<&Scope>) -> Option<Scope> {
    match (parent, child) {
        (Some(parent), Some(child)) => Some(parent.join(child)),
        (Some(parent), None) => Some(parent.clone()),
        (None, child) => child.cloned(),
    }
}

pub(crate) fn join_conditions(
    parent: Option<&Conditions>,
    child: Option<&Conditions>,
) -> Option<Conditions> {
    match (parent, child) {
        (Some(parent), Some(child)) => Some(merge_conditions(parent, child)),
        (Some(parent), None) => Some(parent.clone()),
        (None, child) => child.cloned(),
    }
}
