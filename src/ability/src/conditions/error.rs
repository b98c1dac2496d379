//! Error types for condition evaluation

use thiserror::Error;

/// Condition evaluation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    /// `$cel` expression failed to parse
    #[error("CEL compilation failed: {0}")]
    CompilationError(String),

    /// `$cel` expression failed at runtime (missing variable, type mismatch)
    #[error("CEL evaluation failed: {0}")]
    EvaluationError(String),

    /// `$cel` expression evaluated to something other than a boolean
    #[error("Expression did not return boolean result")]
    NonBooleanResult,

    /// `$`-prefixed key that is not a supported operator
    #[error("Unknown condition operator: {0}")]
    UnknownOperator(String),

    /// Operator given an operand of the wrong shape
    #[error("Invalid operand for {operator}: {reason}")]
    InvalidOperand {
        /// Operator key, e.g. `$in`
        operator: String,
        /// What was wrong with the operand
        reason: String,
    },
}

/// Result type for condition operations
pub type Result<T> = std::result::Result<T, ConditionError>;
