//! # CretoAI Ability
//!
//! Scoped, conditional permission engine for multi-tenant applications.
//!
//! ## Features
//!
//! - **Hierarchical scopes** (`org:123:app:456`) with segment-bounded `*` wildcards
//! - **Compact permission strings** (`!org:123:user,role:read{orgId:123}`)
//! - **Flatten/group transforms** between nested groups and flat lists
//! - **Condition queries** with comparison operators and CEL expressions
//! - **Ability** decision object, immutable and shareable across threads
//!
//! ## Example
//!
//! ```rust
//! use cretoai_ability::{can, Ability, PermissionGroup, PermissionItem};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let org = PermissionGroup::new(vec!["user:read".into(), "project:update".into()])
//!         .in_scope("org:123")?;
//!
//!     let ability = Ability::new([
//!         PermissionItem::from(org),
//!         "post:update{authorId:\"u1\"}".into(),
//!     ])?;
//!
//!     let request = can("read", "user").in_scope("org:123:app:456")?;
//!     assert!(ability.test(&request, None));
//!
//!     let context = json!({ "authorId": "u1" });
//!     assert!(ability.test(&can("update", "post"), Some(&context)));
//!
//!     Ok(())
//! }
//! ```

pub mod ability;
pub mod conditions;
pub mod error;
pub mod permission;
pub mod scope;
pub mod transform;

// Re-export commonly used types
pub use ability::{create_ability, Ability, AbilityConfig, PermissionMatcher};
pub use conditions::{ConditionError, ConditionEvaluator, Conditions};
pub use error::{AuthzError, Result};
pub use permission::{
    can, cannot, is_permission, is_permission_group, parse_permission_string, permission,
    stringify_permission, IntoNames, Permission, PermissionGroup, PermissionItem,
    PermissionType,
};
pub use scope::{
    create_scope_regex, get_id_from_scope, is_global_scope, is_parent_scope, merge_scopes,
    parse_scope, parse_scope_ids, stringify_scope, stringify_scope_with, Scope, ScopeError,
    ScopeSource, ScopeSubject,
};
pub use transform::{
    flatten_permissions, group_permissions, modify_permission, FlattenOptions, GroupOptions,
    ModifyOptions,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
