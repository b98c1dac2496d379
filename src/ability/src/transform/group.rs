//! Group compaction

use tracing::trace;

use crate::conditions::Conditions;
use crate::error::Result;
use crate::permission::{PermissionGroup, PermissionItem};
use crate::scope::Scope;

/// Options for [`group_permissions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Leave scopes on the items instead of grouping by them
    pub ignore_scope: bool,

    /// Leave conditions on the items instead of grouping by them
    pub ignore_conditions: bool,
}

/// Collect permissions that share scope and conditions into groups
///
/// Each item is keyed by its own scope and conditions (minus whatever the
/// options ignore); the keyed parts move onto the group and are stripped
/// from the item. Keys compare exactly, so an explicit global scope or an
/// empty condition object is a different key from an absent one. A nested
/// group whose own scope and conditions all move contributes its children
/// directly, otherwise it is nested as a single child. Deep-equal items are added to a group only once.
///
/// `flatten_permissions(group_permissions(l))` yields the same leaves as
/// `flatten_permissions(l)`.
///
/// # Errors
/// Fails on the first permission string that does not decode.
pub fn group_permissions(
    items: &[PermissionItem],
    options: &GroupOptions,
) -> Result<Vec<PermissionGroup>> {
    let mut groups: Vec<PermissionGroup> = Vec::new();

    for item in items {
        let (key, stripped) = split_key(item.clone().decode()?, options);

        let target = match groups
            .iter()
            .position(|g| g.scope == key.scope && g.conditions == key.conditions)
        {
            Some(idx) => idx,
            None => {
                groups.push(PermissionGroup {
                    permissions: Vec::new(),
                    conditions: key.conditions,
                    scope: key.scope,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[target];
        match stripped {
            PermissionItem::Group(nested) if nested.scope.is_none() && nested.conditions.is_none() => {
                for child in nested.permissions {
                    push_unique(group, child.decode()?);
                }
            }
            other => push_unique(group, other),
        }
    }

    trace!(input = items.len(), groups = groups.len(), "grouped permissions");
    Ok(groups)
}

struct GroupKey {
    scope: Option<Scope>,
    conditions: Option<Conditions>,
}

fn split_key(item: PermissionItem, options: &GroupOptions) -> (GroupKey, PermissionItem) {
    let mut key = GroupKey {
        scope: None,
        conditions: None,
    };

    let stripped = match item {
        PermissionItem::Leaf(mut permission) => {
            if !options.ignore_scope {
                key.scope = permission.scope.take();
            }
            if !options.ignore_conditions {
                key.conditions = permission.conditions.take();
            }
            PermissionItem::Leaf(permission)
        }
        PermissionItem::Group(mut group) => {
            if !options.ignore_scope {
                key.scope = group.scope.take();
            }
            if !options.ignore_conditions {
                key.conditions = group.conditions.take();
            }
            PermissionItem::Group(group)
        }
        encoded @ PermissionItem::Encoded(_) => encoded,
    };

    (key, stripped)
}

fn push_unique(group: &mut PermissionGroup, item: PermissionItem) {
    if !group.permissions.contains(&item) {
        group.permissions.push(item);
    }
}
