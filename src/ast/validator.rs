use crate::ast::{ASTNode, ArithmeticOperator, Operator, UnaryOperator};
use crate::error::ValidationError;
use crate::functions::{Entry, Function, FunctionRegistry};
use log::{debug, trace};
use std::collections::{BTreeSet, HashSet};

/// How a validated identifier is resolved at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A registry constant, already resolved to its value.
    Constant { name: String, value: f64 },
    /// A caller-declared variable, bound by the evaluation context.
    Variable(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Constant { name, .. } => name,
            Symbol::Variable(name) => name,
        }
    }
}

/// The only node kinds a validated tree can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedNode {
    Literal(f64),
    Identifier(Symbol),
    UnaryOp(UnaryOperator, Box<ValidatedNode>),
    BinaryOp(ArithmeticOperator, Box<ValidatedNode>, Box<ValidatedNode>),
    Call(Function, Vec<ValidatedNode>),
}

impl ValidatedNode {
    fn to_ast(&self) -> ASTNode {
        match self {
            ValidatedNode::Literal(value) => ASTNode::Number(*value),
            ValidatedNode::Identifier(symbol) => ASTNode::Identifier(symbol.name().to_string()),
            ValidatedNode::UnaryOp(operator, operand) => ASTNode::UnaryOperation {
                operator: *operator,
                operand: Box::new(operand.to_ast()),
            },
            ValidatedNode::BinaryOp(operator, left, right) => ASTNode::BinaryOperation {
                left: Box::new(left.to_ast()),
                operator: Operator::from(*operator),
                right: Box::new(right.to_ast()),
            },
            ValidatedNode::Call(function, args) => ASTNode::FunctionCall {
                callee: Box::new(ASTNode::Identifier(function.name().to_string())),
                args: args.iter().map(ValidatedNode::to_ast).collect(),
            },
        }
    }
}

/// A tree that passed whitelist validation.
///
/// There is no public constructor: the only way to obtain one is
/// [`Validator::validate`] (or the [`validate`] shorthand), so an evaluator
/// can never be handed an unchecked tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExpression {
    root: ValidatedNode,
    variables: BTreeSet<String>,
}

impl ValidatedExpression {
    pub fn root(&self) -> &ValidatedNode {
        &self.root
    }

    /// Declared variables the expression actually references.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    /// Lowers the tree back into the generic form, e.g. to re-validate it.
    pub fn to_ast(&self) -> ASTNode {
        self.root.to_ast()
    }
}

pub struct Validator<'a> {
    allowed_variables: &'a HashSet<String>,
    registry: &'a FunctionRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(allowed_variables: &'a HashSet<String>, registry: &'a FunctionRegistry) -> Self {
        Self {
            allowed_variables,
            registry,
        }
    }

    pub fn validate(&self, ast: &ASTNode) -> Result<ValidatedExpression, ValidationError> {
        // A variable named like a registry entry could never be bound, since
        // contexts may not rebind registry names.
        let mut allowed: Vec<_> = self.allowed_variables.iter().collect();
        allowed.sort();
        if let Some(name) = allowed.into_iter().find(|name| self.registry.contains(name)) {
            return Err(ValidationError::ReservedVariableName(name.to_string()));
        }

        let mut variables = BTreeSet::new();
        let root = self.validate_node(ast, &mut variables)?;
        debug!("Validated expression {} (variables: {:?})", ast, variables);

        Ok(ValidatedExpression { root, variables })
    }

    fn validate_node(
        &self,
        node: &ASTNode,
        variables: &mut BTreeSet<String>,
    ) -> Result<ValidatedNode, ValidationError> {
        trace!("Validating node: {}", node);
        match node {
            ASTNode::Number(value) => Ok(ValidatedNode::Literal(*value)),

            ASTNode::Identifier(name) => self.resolve_identifier(name, variables),

            ASTNode::UnaryOperation { operator, operand } => Ok(ValidatedNode::UnaryOp(
                *operator,
                Box::new(self.validate_node(operand, variables)?),
            )),

            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => {
                let operator = ArithmeticOperator::try_from(*operator).map_err(|_| {
                    ValidationError::UnsupportedSyntax("bitwise xor".to_string())
                })?;
                Ok(ValidatedNode::BinaryOp(
                    operator,
                    Box::new(self.validate_node(left, variables)?),
                    Box::new(self.validate_node(right, variables)?),
                ))
            }

            ASTNode::FunctionCall { callee, args } => self.validate_call(callee, args, variables),

            ASTNode::PropertyAccess { .. } => Err(ValidationError::UnsupportedSyntax(
                "member access".to_string(),
            )),
        }
    }

    fn resolve_identifier(
        &self,
        name: &str,
        variables: &mut BTreeSet<String>,
    ) -> Result<ValidatedNode, ValidationError> {
        match self.registry.get(name) {
            Some(Entry::Constant(value)) => Ok(ValidatedNode::Identifier(Symbol::Constant {
                name: name.to_string(),
                value: *value,
            })),
            Some(Entry::Function(_)) => Err(ValidationError::FunctionNotCalled(name.to_string())),
            None if self.allowed_variables.contains(name) => {
                variables.insert(name.to_string());
                Ok(ValidatedNode::Identifier(Symbol::Variable(name.to_string())))
            }
            None => Err(ValidationError::UnknownIdentifier(name.to_string())),
        }
    }

    fn validate_call(
        &self,
        callee: &ASTNode,
        args: &[ASTNode],
        variables: &mut BTreeSet<String>,
    ) -> Result<ValidatedNode, ValidationError> {
        let function = match callee {
            ASTNode::Identifier(name) => match self.registry.get(name) {
                Some(Entry::Function(function)) => *function,
                _ => return Err(ValidationError::UnsupportedCall(format!("'{}'", name))),
            },
            other => return Err(ValidationError::UnsupportedCall(format!("'{}'", other))),
        };

        if args.len() != function.arity() {
            return Err(ValidationError::ArityError {
                name: function.name().to_string(),
                expected: function.arity(),
                got: args.len(),
            });
        }

        let args = args
            .iter()
            .map(|arg| self.validate_node(arg, variables))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedNode::Call(function, args))
    }
}

/// Checks `ast` against the registry and the caller's declared variables.
pub fn validate(
    ast: &ASTNode,
    allowed_variables: &HashSet<String>,
    registry: &FunctionRegistry,
) -> Result<ValidatedExpression, ValidationError> {
    Validator::new(allowed_variables, registry).validate(ast)
}
