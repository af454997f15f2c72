use crate::ast::{ASTNode, Operator, UnaryOperator};
use crate::config::EvaluatorConfig;
use crate::error::{ConstructionError, SyntaxError};
use log::{debug, trace};
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Span};
use pest_derive::Parser;

const FRAGMENT_LEN: usize = 24;

#[derive(Parser)]
#[grammar = "./expression.pest"] // Link to the grammar file
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses `input` under the default limits of [`EvaluatorConfig`].
    pub fn parse_expression(input: &str) -> Result<ASTNode, ConstructionError> {
        Self::parse_with_config(input, &EvaluatorConfig::default())
    }

    /// Parses `input` into a generic tree. No whitelist is applied here.
    ///
    /// The size and nesting limits are checked on the raw text first, so the
    /// grammar never recurses deeper than `config.max_depth` levels.
    pub fn parse_with_config(
        input: &str,
        config: &EvaluatorConfig,
    ) -> Result<ASTNode, ConstructionError> {
        debug!("Parsing expression: {}", input);

        if input.len() > config.max_source_len {
            return Err(ConstructionError::ExpressionTooLong {
                len: input.len(),
                max: config.max_source_len,
            });
        }

        if input.trim().is_empty() {
            return Err(SyntaxError {
                position: 0,
                fragment: String::new(),
                message: "empty expression".to_string(),
            }
            .into());
        }

        let depth = nesting_depth(input);
        if depth > config.max_depth {
            return Err(ConstructionError::NestingTooDeep {
                depth,
                max: config.max_depth,
            });
        }

        let ast = Self::parse_tree(input)?;

        let depth = ast.depth();
        if depth > config.max_tree_depth {
            return Err(ConstructionError::NestingTooDeep {
                depth,
                max: config.max_tree_depth,
            });
        }

        debug!("Parse result: {}", ast);
        Ok(ast)
    }

    fn parse_tree(input: &str) -> Result<ASTNode, SyntaxError> {
        let expression = Self::parse(Rule::expression, input)
            .map_err(|e| from_pest_error(input, e))?
            .next()
            .ok_or_else(|| SyntaxError {
                position: 0,
                fragment: fragment(input),
                message: "failed to parse expression".to_string(),
            })?;

        let span = expression.as_span();
        let mut pairs = expression.into_inner();
        Self::build_xor_expression(next_pair(&mut pairs, span, "expression")?)
    }

    fn build_xor_expression(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        Self::build_binary_chain(pair, Self::build_sum)
    }

    fn build_sum(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        Self::build_binary_chain(pair, Self::build_product)
    }

    fn build_product(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        Self::build_binary_chain(pair, Self::build_unary)
    }

    /// Folds `operand (operator operand)*` to the left.
    fn build_binary_chain(
        pair: Pair<Rule>,
        build_operand: fn(Pair<Rule>) -> Result<ASTNode, SyntaxError>,
    ) -> Result<ASTNode, SyntaxError> {
        trace!("Building {:?}: {}", pair.as_rule(), pair.as_str());
        let span = pair.as_span();
        let mut pairs = pair.into_inner();
        let mut node = build_operand(next_pair(&mut pairs, span, "operand")?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator = Operator::try_from(operator_pair.as_str())
                .map_err(|message| grammar_error(operator_pair.as_span(), message))?;
            let right = build_operand(next_pair(&mut pairs, span, "right operand")?)?;
            node = ASTNode::BinaryOperation {
                left: Box::new(node),
                operator,
                right: Box::new(right),
            };
        }

        Ok(node)
    }

    fn build_unary(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        let span = pair.as_span();
        let mut operators = Vec::new();
        let mut operand = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::PLUS | Rule::MINUS => operators.push(
                    UnaryOperator::try_from(inner.as_str())
                        .map_err(|message| grammar_error(inner.as_span(), message))?,
                ),
                Rule::power => operand = Some(Self::build_power(inner)?),
                _ => return Err(unexpected(&inner)),
            }
        }

        let mut node = operand.ok_or_else(|| grammar_error(span, "expected an operand"))?;
        for operator in operators.into_iter().rev() {
            node = ASTNode::UnaryOperation {
                operator,
                operand: Box::new(node),
            };
        }

        Ok(node)
    }

    fn build_power(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        let span = pair.as_span();
        let mut pairs = pair.into_inner();
        let base = Self::build_postfix(next_pair(&mut pairs, span, "operand")?)?;

        if pairs.next().is_none() {
            return Ok(base);
        }

        // Right associative: the exponent is a full unary expression.
        let exponent = Self::build_unary(next_pair(&mut pairs, span, "exponent")?)?;
        Ok(ASTNode::BinaryOperation {
            left: Box::new(base),
            operator: Operator::Power,
            right: Box::new(exponent),
        })
    }

    fn build_postfix(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        let span = pair.as_span();
        let mut pairs = pair.into_inner();
        let mut node = Self::build_primary(next_pair(&mut pairs, span, "operand")?)?;

        for suffix in pairs {
            node = match suffix.as_rule() {
                Rule::call_arguments => {
                    let args = suffix
                        .into_inner()
                        .map(Self::build_xor_expression)
                        .collect::<Result<Vec<_>, _>>()?;
                    ASTNode::FunctionCall {
                        callee: Box::new(node),
                        args,
                    }
                }
                Rule::member => {
                    let member_span = suffix.as_span();
                    let property = next_pair(&mut suffix.into_inner(), member_span, "name")?;
                    ASTNode::PropertyAccess {
                        base: Box::new(node),
                        property: property.as_str().to_string(),
                    }
                }
                _ => return Err(unexpected(&suffix)),
            };
        }

        Ok(node)
    }

    fn build_primary(pair: Pair<Rule>) -> Result<ASTNode, SyntaxError> {
        trace!("Building primary expression: {:?}", pair);
        match pair.as_rule() {
            Rule::number => {
                let value = pair
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| grammar_error(pair.as_span(), e.to_string()))?;
                Ok(ASTNode::Number(value))
            }
            Rule::identifier => Ok(ASTNode::Identifier(pair.as_str().to_string())),
            Rule::group => {
                let span = pair.as_span();
                let inner = next_pair(&mut pair.into_inner(), span, "expression")?;
                Self::build_xor_expression(inner)
            }
            _ => Err(unexpected(&pair)),
        }
    }
}

/// Upper bound on how deeply the grammar recurses for `source`.
///
/// Counts open parentheses plus the `**` operators chained at each open
/// level; a lower-precedence binary operator ends a chain. Only the raw bytes
/// are inspected, so this is safe to run on hostile input of any shape.
pub(crate) fn nesting_depth(source: &str) -> usize {
    let bytes = source.as_bytes();
    let mut levels: Vec<usize> = vec![0];
    let mut after_operand = false;
    let mut max_depth = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                levels.push(0);
                after_operand = false;
            }
            b')' => {
                if levels.len() > 1 {
                    levels.pop();
                }
                after_operand = true;
            }
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                if let Some(chain) = levels.last_mut() {
                    *chain += 1;
                }
                after_operand = false;
                i += 1;
            }
            // Prefix sign, part of the operand that follows.
            b'+' | b'-' if !after_operand => {}
            b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b',' => {
                if let Some(chain) = levels.last_mut() {
                    *chain = 0;
                }
                after_operand = false;
            }
            byte if byte.is_ascii_digit() || byte == b'.' => {
                i = skip_number(bytes, i);
                after_operand = true;
                continue;
            }
            byte if byte.is_ascii_whitespace() => {}
            _ => after_operand = true,
        }

        let depth = levels.len() - 1 + levels.iter().sum::<usize>();
        max_depth = max_depth.max(depth);
        i += 1;
    }

    max_depth
}

// The exponent sign of `1e-5` must not read as a binary minus.
fn skip_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
    }
    i
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    parent: Span<'i>,
    expected: &str,
) -> Result<Pair<'i, Rule>, SyntaxError> {
    pairs
        .next()
        .ok_or_else(|| grammar_error(parent, format!("expected {}", expected)))
}

fn fragment(input: &str) -> String {
    input.chars().take(FRAGMENT_LEN).collect()
}

fn grammar_error(span: Span, message: impl Into<String>) -> SyntaxError {
    SyntaxError {
        position: span.start(),
        fragment: fragment(span.as_str()),
        message: message.into(),
    }
}

fn unexpected(pair: &Pair<Rule>) -> SyntaxError {
    grammar_error(
        pair.as_span(),
        format!("unexpected {}", describe_rule(&pair.as_rule())),
    )
}

fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::number => "number",
        Rule::identifier => "identifier",
        Rule::call_arguments => "argument list",
        Rule::member => "member access",
        Rule::POW => "'**'",
        Rule::STAR => "'*'",
        Rule::SLASH => "'/'",
        Rule::MOD => "'%'",
        Rule::PLUS => "'+'",
        Rule::MINUS => "'-'",
        Rule::XOR => "'^'",
        _ => "expression",
    }
}

fn from_pest_error(input: &str, error: pest::error::Error<Rule>) -> SyntaxError {
    let error = error.renamed_rules(|rule| describe_rule(rule).to_string());
    let position = match error.location {
        InputLocation::Pos(position) => position,
        InputLocation::Span((start, _)) => start,
    };

    SyntaxError {
        position,
        fragment: fragment(input.get(position..).unwrap_or_default()),
        message: error.variant.message().into_owned(),
    }
}
