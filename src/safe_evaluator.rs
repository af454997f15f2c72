use crate::ast::{
    evaluate, validate, Compiler, Context, Executor, Parser, Program, ValidatedExpression,
};
use crate::config::{EvaluatorConfig, NumericPolicy};
use crate::error::{ConstructionError, EvaluationError};
use crate::functions::{registry, FunctionRegistry};
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// A formula that has been parsed, validated and compiled once, and can be
/// evaluated any number of times.
///
/// ```
/// use safe_eval_rs::{Context, SafeEvaluator};
///
/// let evaluator = SafeEvaluator::new("x + y*lc", ["x", "y", "lc"]).unwrap();
/// let context = Context::from([
///     ("x".to_string(), 1.0),
///     ("y".to_string(), 2.0),
///     ("lc".to_string(), 0.5),
/// ]);
/// assert_eq!(evaluator.evaluate(&context), Ok(2.0));
/// ```
#[derive(Debug, Clone)]
pub struct SafeEvaluator {
    source: String,
    allowed_variables: BTreeSet<String>,
    expression: ValidatedExpression,
    program: Program,
    registry: &'static FunctionRegistry,
    config: EvaluatorConfig,
}

impl SafeEvaluator {
    /// Parses and validates `expression`, permitting the given free variables.
    pub fn new<I, S>(expression: &str, allowed_variables: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(expression)
            .allow_variables(allowed_variables)
            .build()
    }

    pub fn builder(expression: &str) -> EvaluatorBuilder {
        EvaluatorBuilder::new(expression)
    }

    /// Evaluates the compiled program against `context`.
    pub fn evaluate(&self, context: &Context) -> Result<f64, EvaluationError> {
        let value =
            Executor::for_program(&self.program).execute(&self.program, self.registry, context)?;
        self.config.numeric_policy.check(value)
    }

    /// Evaluates by walking the validated tree. Always agrees with
    /// [`SafeEvaluator::evaluate`].
    pub fn evaluate_tree(&self, context: &Context) -> Result<f64, EvaluationError> {
        let value = evaluate(&self.expression, self.registry, context)?;
        self.config.numeric_policy.check(value)
    }

    /// Evaluates every context in parallel. Results keep the input order.
    pub fn evaluate_batch(&self, contexts: &[Context]) -> Vec<Result<f64, EvaluationError>> {
        contexts
            .par_iter()
            .map(|context| self.evaluate(context))
            .collect()
    }

    /// The trimmed source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn allowed_variables(&self) -> &BTreeSet<String> {
        &self.allowed_variables
    }

    /// Declared variables the expression actually references.
    pub fn variables(&self) -> &BTreeSet<String> {
        self.expression.variables()
    }

    pub fn expression(&self) -> &ValidatedExpression {
        &self.expression
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }
}

pub struct EvaluatorBuilder {
    expression: String,
    allowed_variables: HashSet<String>,
    config: EvaluatorConfig,
}

impl EvaluatorBuilder {
    pub fn new(expression: &str) -> Self {
        EvaluatorBuilder {
            expression: expression.to_string(),
            allowed_variables: HashSet::new(),
            config: EvaluatorConfig::default(),
        }
    }

    pub fn allow_variable(mut self, name: impl Into<String>) -> Self {
        self.allowed_variables.insert(name.into());
        self
    }

    pub fn allow_variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_variables
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn numeric_policy(mut self, policy: NumericPolicy) -> Self {
        self.config.numeric_policy = policy;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Parses, validates and compiles. Nothing is returned unless every stage
    /// succeeds.
    pub fn build(self) -> Result<SafeEvaluator, ConstructionError> {
        let source = self.expression.trim();
        let ast = Parser::parse_with_config(source, &self.config)?;
        let expression = validate(&ast, &self.allowed_variables, registry())?;
        let program = Compiler::compile(&expression);
        debug!(
            "Compiled '{}' into {} instructions",
            source,
            program.instructions().len()
        );

        Ok(SafeEvaluator {
            source: source.to_string(),
            allowed_variables: self.allowed_variables.into_iter().collect(),
            expression,
            program,
            registry: registry(),
            config: self.config,
        })
    }
}
