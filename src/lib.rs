//! Sandboxed evaluation of user-supplied math formulas.
//!
//! A formula is parsed into a generic tree, checked against a closed whitelist
//! of numbers, declared variables, registry constants and direct calls to
//! registry functions, then compiled once. The resulting [`SafeEvaluator`] can
//! be evaluated any number of times, from any number of threads.
//!
//! ```
//! use safe_eval_rs::{Context, SafeEvaluator};
//!
//! let evaluator = SafeEvaluator::new("sin(pi/2) + x", ["x"]).unwrap();
//! let context = Context::from([("x".to_string(), 1.0)]);
//! assert_eq!(evaluator.evaluate(&context), Ok(2.0));
//!
//! assert!(SafeEvaluator::new("import os", ["x"]).is_err());
//! assert!(SafeEvaluator::new("math.sin(0)", ["x"]).is_err());
//! ```
//!
//! For one-off evaluation, [`evaluate_expression`] parses, validates and runs
//! in a single call, permitting the variables bound in the context.

pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
pub mod functions;
mod safe_evaluator;

pub use ast::Context;
pub use cache::FormulaCache;
pub use config::{EvaluatorConfig, NumericPolicy};
pub use error::{ConstructionError, EvaluationError, SafeEvalError, SyntaxError, ValidationError};
pub use safe_evaluator::{EvaluatorBuilder, SafeEvaluator};

/// Parses, validates and evaluates `expression` in one go.
///
/// Every context key except registry names is a permitted variable. A key
/// naming a registry entry fails with
/// [`EvaluationError::ContextOverridesReservedName`].
///
/// ```
/// use safe_eval_rs::{evaluate_expression, Context};
///
/// let context = Context::from([("x".to_string(), 1.0), ("y".to_string(), 2.0)]);
/// assert_eq!(evaluate_expression("x + y", &context), Ok(3.0));
/// ```
pub fn evaluate_expression(expression: &str, context: &Context) -> Result<f64, SafeEvalError> {
    let registry = functions::registry();
    let allowed = context.keys().filter(|name| !registry.contains(name)).cloned();
    let evaluator = SafeEvaluator::new(expression, allowed)?;
    Ok(evaluator.evaluate(context)?)
}
