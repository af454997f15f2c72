use crate::functions::FunctionRegistry;
use std::f64::consts::{PI, TAU};

pub fn register(registry: &mut FunctionRegistry) {
    registry.register_constant("pi", PI);
    registry.register_constant("tau", TAU);
}
