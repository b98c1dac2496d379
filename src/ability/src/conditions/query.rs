//! Condition query matching
//!
//! Queries follow the familiar document-query shape:
//!
//! ```text
//! { "orgId": "123", "age": { "$gte": 18 }, "$or": [ { "role": "admin" }, { "owner": true } ] }
//! ```
//!
//! Field keys may be dotted paths into the context. A field whose value is
//! an array matches a scalar condition if any element matches.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::{Map, Value};
use tracing::trace;

use crate::conditions::cel::CelEngine;
use crate::conditions::error::{ConditionError, Result};

/// Structured predicate over a context record
pub type Conditions = Map<String, Value>;

/// Evaluates condition queries against context records
///
/// Holds the CEL engine used for `$cel` entries so compiled expressions are
/// shared across evaluations.
#[derive(Default)]
pub struct ConditionEvaluator {
    cel: CelEngine,
}

impl ConditionEvaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `context` satisfies `query`
    ///
    /// # Errors
    /// Unknown operators, malformed operands and CEL failures are errors.
    pub fn matches(&self, query: &Conditions, context: &Value) -> Result<bool> {
        for (key, condition) in query {
            let matched = match key.as_str() {
                "$and" => {
                    let mut all = true;
                    for sub in sub_queries("$and", condition)? {
                        if !self.matches(sub, context)? {
                            all = false;
                            break;
                        }
                    }
                    all
                }
                "$or" => self.any_match("$or", condition, context)?,
                "$nor" => !self.any_match("$nor", condition, context)?,
                "$cel" => {
                    let expr = condition.as_str().ok_or_else(|| invalid("$cel", "expected a string"))?;
                    self.cel.evaluate_expression(expr, context)?
                }
                op if op.starts_with('$') => {
                    return Err(ConditionError::UnknownOperator(op.to_string()));
                }
                path => self.match_field(resolve_path(context, path), condition)?,
            };

            if !matched {
                trace!(key = %key, "condition entry did not match");
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any_match(&self, operator: &str, condition: &Value, context: &Value) -> Result<bool> {
        for sub in sub_queries(operator, condition)? {
            if self.matches(sub, context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn match_field(&self, actual: Option<&Value>, condition: &Value) -> Result<bool> {
        match condition {
            Value::Object(ops) if is_operator_object(ops) => {
                for (operator, operand) in ops {
                    if !self.apply_operator(operator, operand, actual, ops)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            expected => Ok(equals(actual, expected)),
        }
    }

    fn apply_operator(
        &self,
        operator: &str,
        operand: &Value,
        actual: Option<&Value>,
        siblings: &Conditions,
    ) -> Result<bool> {
        let result = match operator {
            "$eq" => equals(actual, operand),
            "$ne" => !equals(actual, operand),
            "$gt" => compare_any(actual, operand, |o| o == Ordering::Greater),
            "$gte" => compare_any(actual, operand, |o| o != Ordering::Less),
            "$lt" => compare_any(actual, operand, |o| o == Ordering::Less),
            "$lte" => compare_any(actual, operand, |o| o != Ordering::Greater),
            "$in" => array_operand(operator, operand)?
                .iter()
                .any(|candidate| equals(actual, candidate)),
            "$nin" => !array_operand(operator, operand)?
                .iter()
                .any(|candidate| equals(actual, candidate)),
            "$exists" => {
                let expected = operand.as_bool().ok_or_else(|| invalid(operator, "expected a boolean"))?;
                actual.is_some() == expected
            }
            "$regex" => {
                let pattern = operand.as_str().ok_or_else(|| invalid(operator, "expected a string"))?;
                let case_insensitive = siblings
                    .get("$options")
                    .and_then(Value::as_str)
                    .is_some_and(|options| options.contains('i'));
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| invalid(operator, &e.to_string()))?;
                any_element(actual, |value| value.as_str().is_some_and(|s| regex.is_match(s)))
            }
            "$options" => true,
            "$size" => {
                let size = operand.as_u64().ok_or_else(|| invalid(operator, "expected a non-negative integer"))?;
                matches!(actual, Some(Value::Array(items)) if items.len() as u64 == size)
            }
            "$all" => {
                let required = array_operand(operator, operand)?;
                match actual {
                    Some(Value::Array(items)) => required
                        .iter()
                        .all(|r| items.iter().any(|item| values_equal(item, r))),
                    _ => false,
                }
            }
            "$elemMatch" => {
                let query = operand.as_object().ok_or_else(|| invalid(operator, "expected an object"))?;
                match actual {
                    Some(Value::Array(items)) => {
                        let mut found = false;
                        for item in items {
                            let matched = if is_operator_object(query) {
                                self.match_field(Some(item), operand)?
                            } else {
                                self.matches(query, item)?
                            };
                            if matched {
                                found = true;
                                break;
                            }
                        }
                        found
                    }
                    _ => false,
                }
            }
            "$not" => !self.match_field(actual, operand)?,
            other => return Err(ConditionError::UnknownOperator(other.to_string())),
        };

        Ok(result)
    }
}

/// Deep-merge two condition objects
///
/// Keys of `overlay` override `base`; nested objects merge recursively.
pub fn merge_conditions(base: &Conditions, overlay: &Conditions) -> Conditions {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                Value::Object(merge_conditions(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Structural subsumption: every entry of `subset` is present and equal in `superset`
pub fn is_subset(subset: &Conditions, superset: &Conditions) -> bool {
    subset
        .iter()
        .all(|(key, value)| superset.get(key).is_some_and(|other| values_equal(value, other)))
}

fn is_operator_object(map: &Conditions) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn sub_queries<'a>(operator: &str, condition: &'a Value) -> Result<Vec<&'a Conditions>> {
    let items = array_operand(operator, condition)?;
    items
        .iter()
        .map(|item| item.as_object().ok_or_else(|| invalid(operator, "expected an array of objects")))
        .collect()
}

fn array_operand<'a>(operator: &str, operand: &'a Value) -> Result<&'a Vec<Value>> {
    operand.as_array().ok_or_else(|| invalid(operator, "expected an array"))
}

fn invalid(operator: &str, reason: &str) -> ConditionError {
    ConditionError::InvalidOperand {
        operator: operator.to_string(),
        reason: reason.to_string(),
    }
}

fn resolve_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(value) if values_equal(value, expected) => true,
        Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, expected)),
        Some(_) => false,
    }
}

fn any_element(actual: Option<&Value>, predicate: impl Fn(&Value) -> bool) -> bool {
    match actual {
        Some(Value::Array(items)) => items.iter().any(&predicate),
        Some(value) => predicate(value),
        None => false,
    }
}

fn compare_any(actual: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    any_element(actual, |value| compare(value, operand).is_some_and(&accept))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as the same number
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len() && is_subset(a, b)
        }
        _ => left == right,
    }
}
