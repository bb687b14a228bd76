//! Scenario condition evaluation.
//!
//! A condition is a small boolean expression over four request scopes:
//!
//! ```text
//! $header['content-type'] == 'application/json' && $body.items.length > 2
//! $path.id == 42 || $query.tags.contains('beta')
//! ```
//!
//! Evaluation never fails outward: syntax errors, unknown properties, out of
//! range indexes and type mismatches all make the condition `false`. Only an
//! expression whose final value is the boolean `true` holds.

mod interpreter;
mod lexer;
mod parser;

use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Longest accepted expression, in bytes.
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Greatest accepted height of the expression tree, and deepest nesting of
/// groups.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown property '{0}'")]
    UnknownProperty(String),
    #[error("index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("expression longer than {0} bytes")]
    TooLong(usize),
    #[error("expression nested deeper than {0}")]
    TooDeep(usize),
}

/// The values a condition can read.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub header: &'a HashMap<String, String>,
    pub query: &'a HashMap<String, String>,
    pub path: &'a HashMap<String, String>,
    pub body: &'a Value,
}

/// Evaluate a condition, collapsing every failure to `false`.
pub fn evaluate(expression: &str, scope: &Scope<'_>) -> bool {
    match try_evaluate(expression, scope) {
        Ok(holds) => holds,
        Err(e) => {
            debug!(condition = %expression, error = %e, "Condition evaluated to false");
            false
        }
    }
}

/// Evaluate a condition, reporting why it could not be computed.
pub fn try_evaluate(expression: &str, scope: &Scope<'_>) -> Result<bool, ConditionError> {
    let expr = compile(expression)?;
    let value = Interpreter::new(scope).eval(&expr)?;
    Ok(matches!(value.as_ref(), Value::Bool(true)))
}

/// Check that an expression parses, without evaluating it.
pub fn check(expression: &str) -> Result<(), ConditionError> {
    compile(expression).map(|_| ())
}

fn compile(expression: &str) -> Result<parser::Expr, ConditionError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(ConditionError::TooLong(MAX_EXPRESSION_LEN));
    }
    let tokens = Lexer::new(expression).tokenize()?;
    Parser::new(tokens).parse()
}
