//! Structured condition queries
//!
//! A condition query is a JSON object evaluated against a free-form context
//! record. Field entries compare values (`{"user.age": {"$gte": 18}}`),
//! `$and`/`$or`/`$nor` combine sub-queries and `$cel` delegates to a CEL
//! expression compiled with program caching.

pub mod cel;
pub mod error;
pub mod query;

pub use cel::CelEngine;
pub use error::{ConditionError, Result};
pub use query::{is_subset, merge_conditions, ConditionEvaluator, Conditions};
