/// How non-finite results are surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Division by zero, domain errors and overflow yield `inf`/`NaN`.
    #[default]
    Ieee754,
    /// A final result that is `inf` or `NaN` becomes
    /// [`EvaluationError::NonFiniteResult`](crate::error::EvaluationError::NonFiniteResult).
    RejectNonFinite,
}

impl NumericPolicy {
    pub fn check(&self, value: f64) -> Result<f64, crate::error::EvaluationError> {
        match self {
            NumericPolicy::Ieee754 => Ok(value),
            NumericPolicy::RejectNonFinite if value.is_finite() => Ok(value),
            NumericPolicy::RejectNonFinite => {
                Err(crate::error::EvaluationError::NonFiniteResult(value))
            }
        }
    }
}

/// Limits and policies applied while constructing and running an evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatorConfig {
    /// Longest accepted source, in bytes, after trimming.
    pub max_source_len: usize,
    /// Deepest accepted nesting of parentheses and chained `**` operators,
    /// checked on the raw text before the grammar runs.
    pub max_depth: usize,
    /// Longest accepted root-to-leaf path in the parsed tree.
    pub max_tree_depth: usize,
    pub numeric_policy: NumericPolicy,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_source_len: 4096,
            max_depth: 64,
            max_tree_depth: 512,
            numeric_policy: NumericPolicy::default(),
        }
    }
}
