//! Error taxonomy for construction and evaluation of formulas.

use thiserror::Error;

/// Malformed expression text, rejected by the grammar.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid syntax at position {position} near '{fragment}': {message}")]
pub struct SyntaxError {
    /// Byte offset into the source where parsing failed.
    pub position: usize,
    /// The input starting at `position`, truncated for display.
    pub fragment: String,
    pub message: String,
}

/// A syntactically valid tree that falls outside the whitelist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Disallowed syntax in expression: {0}")]
    UnsupportedSyntax(String),

    #[error("Use of unknown variable '{0}' in expression")]
    UnknownIdentifier(String),

    #[error("Only direct function calls are permitted, got call to {0}")]
    UnsupportedCall(String),

    #[error("Function '{name}' takes {expected} argument(s), got {got}")]
    ArityError {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Function '{0}' must be called")]
    FunctionNotCalled(String),

    #[error("Variable name '{0}' is reserved by the function registry")]
    ReservedVariableName(String),
}

/// Failure to turn an expression string into an evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Expression is {len} bytes long, the limit is {max}")]
    ExpressionTooLong { len: usize, max: usize },

    #[error("Expression nests {depth} levels deep, the limit is {max}")]
    NestingTooDeep { depth: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Context cannot override allowed math functions: '{0}'")]
    ContextOverridesReservedName(String),

    #[error("Variable '{0}' is missing from the evaluation context")]
    MissingVariable(String),

    #[error("Expression evaluated to a non-finite value: {0}")]
    NonFiniteResult(f64),

    #[error("Function '{name}' expected {expected} argument(s), but got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Stack underflow while executing compiled expression")]
    StackUnderflow,
}

/// Either stage of the pipeline, for the one-shot helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafeEvalError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl From<SyntaxError> for SafeEvalError {
    fn from(value: SyntaxError) -> Self {
        SafeEvalError::Construction(value.into())
    }
}

impl From<ValidationError> for SafeEvalError {
    fn from(value: ValidationError) -> Self {
        SafeEvalError::Construction(value.into())
    }
}
