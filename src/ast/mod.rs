use std::fmt;

mod compiler;
mod evaluator;
mod parser;
mod validator;

pub use compiler::*;
pub use evaluator::{evaluate, Context};
pub use parser::ExpressionParser as Parser;
pub use validator::*;

/// Generic parse tree, produced by the grammar before any whitelist is
/// applied. Member access and `^` are representable here so the validator can
/// name them when it rejects them.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Number(f64),
    Identifier(String),
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    BinaryOperation {
        left: Box<ASTNode>,
        operator: Operator,
        right: Box<ASTNode>,
    },
    FunctionCall {
        callee: Box<ASTNode>,
        args: Vec<ASTNode>,
    },
    PropertyAccess {
        base: Box<ASTNode>,
        property: String,
    },
}

impl ASTNode {
    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            ASTNode::Number(_) | ASTNode::Identifier(_) => 1,
            ASTNode::UnaryOperation { operand, .. } => 1 + operand.depth(),
            ASTNode::BinaryOperation { left, right, .. } => 1 + left.depth().max(right.depth()),
            ASTNode::FunctionCall { callee, args } => {
                1 + args
                    .iter()
                    .map(ASTNode::depth)
                    .fold(callee.depth(), usize::max)
            }
            ASTNode::PropertyAccess { base, .. } => 1 + base.depth(),
        }
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Number(value) => write!(f, "{}", value),
            ASTNode::Identifier(name) => write!(f, "{}", name),
            ASTNode::UnaryOperation { operator, operand } => {
                write!(f, "{}{}", operator.symbol(), operand)
            }
            ASTNode::BinaryOperation {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
            ASTNode::FunctionCall { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            ASTNode::PropertyAccess { base, property } => write!(f, "{}.{}", base, property),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl UnaryOperator {
    pub fn apply(&self, operand: f64) -> f64 {
        match self {
            UnaryOperator::Negate => -operand,
            UnaryOperator::Plus => operand,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

impl TryFrom<&str> for UnaryOperator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "-" => Ok(UnaryOperator::Negate),
            "+" => Ok(UnaryOperator::Plus),
            _ => Err(format!("Unknown unary operator: {}", value)),
        }
    }
}

/// Every binary operator the grammar understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    BitXor,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "**",
            Operator::BitXor => "^",
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "%" => Ok(Operator::Modulo),
            "**" => Ok(Operator::Power),
            "^" => Ok(Operator::BitXor),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}

/// The binary operators admitted into a validated tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl ArithmeticOperator {
    /// IEEE-754 double arithmetic; nothing here traps.
    ///
    /// Modulo is floored: the result takes the sign of the divisor, so
    /// `-7 % 3 == 2`. A zero divisor gives `NaN`.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            ArithmeticOperator::Add => left + right,
            ArithmeticOperator::Subtract => left - right,
            ArithmeticOperator::Multiply => left * right,
            ArithmeticOperator::Divide => left / right,
            ArithmeticOperator::Modulo => {
                let remainder = left % right;
                if remainder != 0.0 && (remainder < 0.0) != (right < 0.0) {
                    remainder + right
                } else {
                    remainder
                }
            }
            ArithmeticOperator::Power => left.powf(right),
        }
    }
}

impl TryFrom<Operator> for ArithmeticOperator {
    type Error = Operator;

    fn try_from(value: Operator) -> Result<Self, Self::Error> {
        match value {
            Operator::Add => Ok(ArithmeticOperator::Add),
            Operator::Subtract => Ok(ArithmeticOperator::Subtract),
            Operator::Multiply => Ok(ArithmeticOperator::Multiply),
            Operator::Divide => Ok(ArithmeticOperator::Divide),
            Operator::Modulo => Ok(ArithmeticOperator::Modulo),
            Operator::Power => Ok(ArithmeticOperator::Power),
            Operator::BitXor => Err(Operator::BitXor),
        }
    }
}

impl From<ArithmeticOperator> for Operator {
    fn from(value: ArithmeticOperator) -> Self {
        match value {
            ArithmeticOperator::Add => Operator::Add,
            ArithmeticOperator::Subtract => Operator::Subtract,
            ArithmeticOperator::Multiply => Operator::Multiply,
            ArithmeticOperator::Divide => Operator::Divide,
            ArithmeticOperator::Modulo => Operator::Modulo,
            ArithmeticOperator::Power => Operator::Power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floored_modulo() {
        let modulo = ArithmeticOperator::Modulo;
        assert_eq!(modulo.apply(7.0, 3.0), 1.0);
        assert_eq!(modulo.apply(-7.0, 3.0), 2.0);
        assert_eq!(modulo.apply(7.0, -3.0), -2.0);
        assert_eq!(modulo.apply(-7.0, -3.0), -1.0);
        assert_eq!(modulo.apply(6.0, 3.0), 0.0);
        assert!(modulo.apply(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(ArithmeticOperator::Divide.apply(1.0, 0.0), f64::INFINITY);
        assert_eq!(ArithmeticOperator::Divide.apply(-1.0, 0.0), f64::NEG_INFINITY);
        assert!(ArithmeticOperator::Divide.apply(0.0, 0.0).is_nan());
    }

    #[test]
    fn test_xor_has_no_arithmetic_meaning() {
        assert_eq!(ArithmeticOperator::try_from(Operator::BitXor), Err(Operator::BitXor));
        assert_eq!(
            ArithmeticOperator::try_from(Operator::Power),
            Ok(ArithmeticOperator::Power)
        );
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!(Operator::try_from("**"), Ok(Operator::Power));
        assert_eq!(Operator::try_from("^"), Ok(Operator::BitXor));
        assert!(Operator::try_from("==").is_err());
        assert_eq!(UnaryOperator::try_from("-"), Ok(UnaryOperator::Negate));
    }

    #[test]
    fn test_depth_and_display() {
        let node = ASTNode::BinaryOperation {
            left: Box::new(ASTNode::Number(1.0)),
            operator: Operator::Add,
            right: Box::new(ASTNode::FunctionCall {
                callee: Box::new(ASTNode::PropertyAccess {
                    base: Box::new(ASTNode::Identifier("math".to_string())),
                    property: "sin".to_string(),
                }),
                args: vec![ASTNode::UnaryOperation {
                    operator: UnaryOperator::Negate,
                    operand: Box::new(ASTNode::Identifier("x".to_string())),
                }],
            }),
        };
        assert_eq!(node.depth(), 4);
        assert_eq!(node.to_string(), "(1 + math.sin(-x))");
    }
}
