//! CEL expression engine with compiled program caching

use std::sync::Arc;

use cel_interpreter::objects::Value as CelValue;
use cel_interpreter::{Context, Program};
use dashmap::DashMap;
use serde_json::Value;

use crate::conditions::error::{ConditionError, Result};

/// Name under which the whole context record is bound
pub const CONTEXT_VARIABLE: &str = "context";

/// CEL engine for compiling and evaluating `$cel` conditions
pub struct CelEngine {
    /// Compiled program cache (thread-safe)
    program_cache: DashMap<String, Arc<Program>>,
}

impl CelEngine {
    /// Create a new CEL engine
    pub fn new() -> Self {
        Self {
            program_cache: DashMap::new(),
        }
    }

    /// Compile a CEL expression and cache the result
    ///
    /// # Errors
    /// Returns error if expression cannot be compiled
    pub fn compile(&self, expr: &str) -> Result<Arc<Program>> {
        if let Some(prog) = self.program_cache.get(expr) {
            return Ok(prog.clone());
        }

        let program = Program::compile(expr)
            .map_err(|e| ConditionError::CompilationError(format!("{:?}", e)))?;

        let program = Arc::new(program);
        self.program_cache.insert(expr.to_string(), program.clone());

        Ok(program)
    }

    /// Evaluate a compiled program against a context record
    ///
    /// Top-level keys of an object context become variables; the whole
    /// record is also bound as `context`.
    pub fn evaluate(&self, program: &Program, context: &Value) -> Result<bool> {
        let mut cel_context = Context::default();

        if let Value::Object(fields) = context {
            for (key, value) in fields {
                Self::bind(&mut cel_context, key, value)?;
            }
        }
        Self::bind(&mut cel_context, CONTEXT_VARIABLE, context)?;

        let result = program
            .execute(&cel_context)
            .map_err(|e| ConditionError::EvaluationError(format!("{:?}", e)))?;

        match result {
            CelValue::Bool(b) => Ok(b),
            _ => Err(ConditionError::NonBooleanResult),
        }
    }

    /// Compile and evaluate an expression in one call
    pub fn evaluate_expression(&self, expr: &str, context: &Value) -> Result<bool> {
        let program = self.compile(expr)?;
        self.evaluate(&program, context)
    }

    /// Number of cached programs
    pub fn cached_programs(&self) -> usize {
        self.program_cache.len()
    }

    /// Clear the compiled program cache
    pub fn clear_cache(&self) {
        self.program_cache.clear();
    }

    fn bind(cel_context: &mut Context, name: &str, value: &Value) -> Result<()> {
        cel_context
            .add_variable(name.to_string(), value.clone())
            .map_err(|e| ConditionError::EvaluationError(format!("{:?}", e)))
    }
}

impl Default for CelEngine {
    fn default() -> Self {
        Self::new()
    }
}
