//! Permission model and its textual encoding
//!
//! - [`Permission`] / [`PermissionGroup`] / [`PermissionItem`]: value types
//! - [`parse_permission_string`] / [`stringify_permission`]: the compact DSL
//! - [`can`], [`cannot`], [`permission`]: builders

pub mod dsl;
pub mod literal;
pub mod types;

pub use dsl::{parse_permission_string, stringify_permission};
pub use literal::LiteralError;
pub use types::{
    can, cannot, is_permission, is_permission_group, permission, IntoNames, Permission,
    PermissionGroup, PermissionItem, PermissionType,
};
