use crate::ast::evaluator::check_context;
use crate::ast::{
    ArithmeticOperator, Context, Symbol, UnaryOperator, ValidatedExpression, ValidatedNode,
};
use crate::error::EvaluationError;
use crate::functions::{Function, FunctionRegistry};
use log::trace;

/// Stack-machine instructions a validated tree is flattened into.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Push(f64),
    LoadVariable(String),
    Negate,
    Binary(ArithmeticOperator),
    /// Pops `function.arity()` operands, pushes the result.
    Call(Function),
}

/// A flattened expression, in post-order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    max_stack: usize,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Highest stack height reached while executing the program.
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }
}

pub struct Compiler;

impl Compiler {
    pub fn compile(expression: &ValidatedExpression) -> Program {
        let mut program = Program {
            instructions: Vec::new(),
            max_stack: 0,
        };
        let mut height = 0;
        Self::compile_node(expression.root(), &mut program, &mut height);
        program
    }

    fn compile_node(node: &ValidatedNode, program: &mut Program, height: &mut usize) {
        match node {
            ValidatedNode::Literal(value) => Self::emit(program, height, Instruction::Push(*value)),
            ValidatedNode::Identifier(Symbol::Constant { value, .. }) => {
                Self::emit(program, height, Instruction::Push(*value))
            }
            ValidatedNode::Identifier(Symbol::Variable(name)) => {
                Self::emit(program, height, Instruction::LoadVariable(name.clone()))
            }
            ValidatedNode::UnaryOp(operator, operand) => {
                Self::compile_node(operand, program, height);
                match operator {
                    UnaryOperator::Negate => Self::emit(program, height, Instruction::Negate),
                    UnaryOperator::Plus => {}
                }
            }
            ValidatedNode::BinaryOp(operator, left, right) => {
                Self::compile_node(left, program, height);
                Self::compile_node(right, program, height);
                Self::emit(program, height, Instruction::Binary(*operator));
            }
            ValidatedNode::Call(function, args) => {
                for arg in args {
                    Self::compile_node(arg, program, height);
                }
                Self::emit(program, height, Instruction::Call(*function));
            }
        }
    }

    fn emit(program: &mut Program, height: &mut usize, instruction: Instruction) {
        match &instruction {
            Instruction::Push(_) | Instruction::LoadVariable(_) => *height += 1,
            Instruction::Negate => {}
            Instruction::Binary(_) => *height -= 1,
            Instruction::Call(function) => *height = *height + 1 - function.arity(),
        }
        program.max_stack = program.max_stack.max(*height);
        program.instructions.push(instruction);
    }
}

/// Runs compiled programs. One executor serves one thread; build a fresh one
/// per call when evaluating concurrently.
pub struct Executor {
    stack: Vec<f64>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn for_program(program: &Program) -> Self {
        Self {
            stack: Vec::with_capacity(program.max_stack()),
        }
    }

    pub fn execute(
        &mut self,
        program: &Program,
        registry: &FunctionRegistry,
        context: &Context,
    ) -> Result<f64, EvaluationError> {
        check_context(registry, context)?;
        self.stack.clear();

        for instruction in program.instructions() {
            trace!("Executing {:?} (stack: {:?})", instruction, self.stack);
            match instruction {
                Instruction::Push(value) => self.stack.push(*value),

                Instruction::LoadVariable(name) => {
                    let value = context
                        .get(name)
                        .copied()
                        .ok_or_else(|| EvaluationError::MissingVariable(name.clone()))?;
                    self.stack.push(value);
                }

                Instruction::Negate => {
                    let value = self.pop_value()?;
                    self.stack.push(-value);
                }

                Instruction::Binary(operator) => {
                    let right = self.pop_value()?;
                    let left = self.pop_value()?;
                    self.stack.push(operator.apply(left, right));
                }

                Instruction::Call(function) => {
                    let start = self
                        .stack
                        .len()
                        .checked_sub(function.arity())
                        .ok_or(EvaluationError::StackUnderflow)?;
                    let result = function.call(&self.stack[start..])?;
                    self.stack.truncate(start);
                    self.stack.push(result);
                }
            }
        }

        let result = self.pop_value()?;
        if self.stack.is_empty() {
            Ok(result)
        } else {
            Err(EvaluationError::StackUnderflow)
        }
    }

    fn pop_value(&mut self) -> Result<f64, EvaluationError> {
        self.stack.pop().ok_or(EvaluationError::StackUnderflow)
    }
}
