//! Group expansion

use tracing::trace;

use super::{inherit, join_conditions, join_scope, modify_permission, FlattenOptions};
use crate::conditions::Conditions;
use crate::error::Result;
use crate::permission::{Permission, PermissionItem};
use crate::scope::Scope;

/// Expand nested groups into a flat, ordered list of permissions
///
/// Walks depth first. Every leaf receives its ancestors' scopes in front of
/// its own and its ancestors' conditions deep-merged underneath its own.
/// Permission strings are decoded on the way. `options` is applied once to
/// every resulting permission.
///
/// A list that contains only permissions comes back unchanged, which
/// makes flattening idempotent.
///
/// # Errors
/// Fails on the first permission string that does not decode.
///
/// # Examples
///
/// ```
/// use cretoai_ability::{flatten_permissions, FlattenOptions, PermissionGroup, PermissionItem};
///
/// let group = PermissionGroup::new(vec!["user:read".into(), "user:create".into()])
///     .in_scope("org:1")
///     .unwrap();
///
/// let flat = flatten_permissions(&[group.into()], &FlattenOptions::default()).unwrap();
/// assert_eq!(flat.len(), 2);
/// assert_eq!(flat[1].to_string(), "org:1:user:create");
/// ```
pub fn flatten_permissions(
    items: &[PermissionItem],
    options: &FlattenOptions,
) -> Result<Vec<Permission>> {
    let mut flat = Vec::with_capacity(items.len());
    walk(items, None, None, &mut flat)?;

    trace!(input = items.len(), output = flat.len(), "flattened permissions");

    if options.is_noop() {
        return Ok(flat);
    }

    Ok(flat
        .iter()
        .map(|permission| modify_permission(permission, options))
        .collect())
}

fn walk(
    items: &[PermissionItem],
    scope: Option<&Scope>,
    conditions: Option<&Conditions>,
    out: &mut Vec<Permission>,
) -> Result<()> {
    for item in items {
        match item {
            PermissionItem::Leaf(permission) => {
                out.push(inherit(permission.clone(), scope, conditions));
            }
            PermissionItem::Encoded(text) => {
                let permission: Permission = text.parse()?;
                out.push(inherit(permission, scope, conditions));
            }
            PermissionItem::Group(group) => {
                let group_scope = join_scope(scope, group.scope.as_ref());
                let group_conditions = join_conditions(conditions, group.conditions.as_ref());
                walk(
                    &group.permissions,
                    group_scope.as_ref(),
                    group_conditions.as_ref(),
                    out,
                )?;
            }
        }
    }
    Ok(())
}
