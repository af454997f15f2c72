use crate::functions::FunctionRegistry;
use safe_eval_macros::registry_fn;

pub fn register(registry: &mut FunctionRegistry) {
    registry.register_function(SQRT);
    registry.register_function(LOG);
    registry.register_function(LOG10);
    registry.register_function(EXP);
    registry.register_function(FABS);
}

#[registry_fn]
fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

/// Natural logarithm.
#[registry_fn]
fn log(x: f64) -> f64 {
    x.ln()
}

#[registry_fn]
fn log10(x: f64) -> f64 {
    x.log10()
}

#[registry_fn]
fn exp(x: f64) -> f64 {
    x.exp()
}

#[registry_fn]
fn fabs(x: f64) -> f64 {
    x.abs()
}
