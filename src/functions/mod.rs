//! The process-wide table of constants and functions a formula may use.
//!
//! The table is built once, on first use, and is read-only afterwards. Every
//! evaluator shares the same instance through [`registry`].

pub mod constants;
pub mod elementary;
pub mod trigonometric;

use crate::error::EvaluationError;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

pub type NativeFn = fn(&[f64]) -> Result<f64, EvaluationError>;

/// Largest arity a registry function may declare.
pub const MAX_ARITY: usize = 2;

/// A callable registry entry with a fixed arity.
#[derive(Clone, Copy)]
pub struct Function {
    name: &'static str,
    arity: usize,
    call: NativeFn,
}

impl Function {
    pub const fn new(name: &'static str, arity: usize, call: NativeFn) -> Self {
        Self { name, arity, call }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, args: &[f64]) -> Result<f64, EvaluationError> {
        (self.call)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

// Names are unique within a registry, so identity is the name.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry {
    Constant(f64),
    Function(Function),
}

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl FunctionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn register_constant(&mut self, name: &'static str, value: f64) {
        self.entries.insert(name, Entry::Constant(value));
    }

    pub(crate) fn register_function(&mut self, function: Function) {
        debug_assert!(function.arity() <= MAX_ARITY);
        self.entries.insert(function.name(), Entry::Function(function));
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn register_functions(registry: &mut FunctionRegistry) {
    constants::register(registry);
    trigonometric::register(registry);
    elementary::register(registry);
}

lazy_static! {
    static ref REGISTRY: FunctionRegistry = {
        let mut registry = FunctionRegistry::new();
        register_functions(&mut registry);
        registry
    };
}

/// The shared, immutable registry.
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contents() {
        let names = registry().names();
        assert_eq!(
            names,
            vec![
                "acos", "asin", "atan", "atan2", "cos", "exp", "fabs", "log", "log10", "pi", "sin",
                "sqrt", "tan", "tau",
            ]
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            registry().get("pi"),
            Some(&Entry::Constant(std::f64::consts::PI))
        );
        assert_eq!(
            registry().get("tau"),
            Some(&Entry::Constant(std::f64::consts::TAU))
        );
    }

    #[test]
    fn test_function_arity() {
        let arity = |name: &str| match registry().get(name) {
            Some(Entry::Function(function)) => Some(function.arity()),
            _ => None,
        };
        assert_eq!(arity("sin"), Some(1));
        assert_eq!(arity("atan2"), Some(2));
        assert_eq!(arity("pi"), None);
        assert_eq!(arity("print"), None);
    }

    #[test]
    fn test_adapter_rejects_wrong_argument_count() {
        let Some(Entry::Function(sqrt)) = registry().get("sqrt") else {
            panic!("sqrt is not registered as a function");
        };
        assert_eq!(sqrt.call(&[9.0]), Ok(3.0));
        assert_eq!(
            sqrt.call(&[9.0, 1.0]),
            Err(EvaluationError::ArgumentCount {
                name: "sqrt".to_string(),
                expected: 1,
                got: 2,
            })
        );
    }

    #[test]
    fn test_custom_registry_is_independent() {
        let mut custom = FunctionRegistry::new();
        assert!(custom.is_empty());
        custom.register_constant("g", 9.81);
        assert_eq!(custom.len(), 1);
        assert!(!registry().contains("g"));
    }
}
