use crate::ast::{Symbol, ValidatedExpression, ValidatedNode};
use crate::error::EvaluationError;
use crate::functions::{FunctionRegistry, MAX_ARITY};
use log::warn;
use std::collections::HashMap;

/// Per-call binding of variable names to values.
pub type Context = HashMap<String, f64>;

/// Recursively evaluates a validated tree.
///
/// The context may bind declared variables only; a key naming a registry
/// constant or function fails with
/// [`EvaluationError::ContextOverridesReservedName`] instead of shadowing it.
/// Keys the expression does not reference are ignored.
pub fn evaluate(
    expression: &ValidatedExpression,
    registry: &FunctionRegistry,
    context: &Context,
) -> Result<f64, EvaluationError> {
    check_context(registry, context)?;
    evaluate_node(expression.root(), context)
}

pub(crate) fn check_context(
    registry: &FunctionRegistry,
    context: &Context,
) -> Result<(), EvaluationError> {
    // Smallest offending name, so the error does not depend on hash order.
    match context.keys().filter(|name| registry.contains(name)).min() {
        Some(name) => {
            warn!("Rejected context binding for reserved name '{}'", name);
            Err(EvaluationError::ContextOverridesReservedName(name.clone()))
        }
        None => Ok(()),
    }
}

fn evaluate_node(node: &ValidatedNode, context: &Context) -> Result<f64, EvaluationError> {
    match node {
        ValidatedNode::Literal(value) => Ok(*value),

        ValidatedNode::Identifier(Symbol::Constant { value, .. }) => Ok(*value),

        ValidatedNode::Identifier(Symbol::Variable(name)) => context
            .get(name)
            .copied()
            .ok_or_else(|| EvaluationError::MissingVariable(name.clone())),

        ValidatedNode::UnaryOp(operator, operand) => {
            Ok(operator.apply(evaluate_node(operand, context)?))
        }

        ValidatedNode::BinaryOp(operator, left, right) => {
            let left_value = evaluate_node(left, context)?;
            let right_value = evaluate_node(right, context)?;
            Ok(operator.apply(left_value, right_value))
        }

        ValidatedNode::Call(function, args) => {
            let mut values = [0.0; MAX_ARITY];
            for (slot, arg) in values.iter_mut().zip(args) {
                *slot = evaluate_node(arg, context)?;
            }
            function.call(&values[..args.len().min(MAX_ARITY)])
        }
    }
}
