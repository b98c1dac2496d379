//! Hierarchical scope model
//!
//! A scope is a namespace path of alternating type/id pairs
//! (organization -> application -> resource) with `*` wildcards that never
//! cross segment boundaries.
//!
//! # Examples
//!
//! ```
//! use cretoai_ability::scope::{is_parent_scope, Scope};
//!
//! let org: Scope = "org:acme".parse().unwrap();
//! let app: Scope = "org:acme:app:crm".parse().unwrap();
//!
//! assert!(org.is_parent_of(&app));
//! assert!(is_parent_scope("org:*", "org:acme:app:crm").unwrap());
//! ```

mod matcher;
mod types;


pub use matcher::{
    create_scope_regex, get_id_from_scope, is_global_scope, is_parent_scope, merge_scopes,
    parse_scope, parse_scope_ids, stringify_scope, stringify_scope_with,
};
pub use types::{
    Scope, ScopeError, ScopeResult, ScopeSource, ScopeSubject, SCOPE_DELIMITER, SCOPE_WILDCARD,
};
