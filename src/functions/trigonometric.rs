use crate::functions::FunctionRegistry;
use safe_eval_macros::registry_fn;

pub fn register(registry: &mut FunctionRegistry) {
    registry.register_function(SIN);
    registry.register_function(COS);
    registry.register_function(TAN);
    registry.register_function(ASIN);
    registry.register_function(ACOS);
    registry.register_function(ATAN);
    registry.register_function(ATAN2);
}

#[registry_fn]
fn sin(x: f64) -> f64 {
    x.sin()
}

#[registry_fn]
fn cos(x: f64) -> f64 {
    x.cos()
}

#[registry_fn]
fn tan(x: f64) -> f64 {
    x.tan()
}

#[registry_fn]
fn asin(x: f64) -> f64 {
    x.asin()
}

#[registry_fn]
fn acos(x: f64) -> f64 {
    x.acos()
}

#[registry_fn]
fn atan(x: f64) -> f64 {
    x.atan()
}

/// Angle of the point `(x, y)`, with `y` first.
#[registry_fn]
fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_basic_values() {
        assert_eq!(sin(&[0.0]), Ok(0.0));
        assert_eq!(cos(&[0.0]), Ok(1.0));
        assert!((tan(&[FRAC_PI_4]).unwrap() - 1.0).abs() < 1e-12);
        assert!((asin(&[1.0]).unwrap() - FRAC_PI_2).abs() < 1e-15);
        assert_eq!(acos(&[1.0]), Ok(0.0));
        assert_eq!(atan(&[0.0]), Ok(0.0));
    }

    #[test]
    fn test_atan2_argument_order() {
        assert_eq!(atan2(&[1.0, 0.0]), Ok(FRAC_PI_2));
        assert_eq!(atan2(&[0.0, -1.0]), Ok(PI));
    }

    #[test]
    fn test_domain_errors_are_nan() {
        assert!(asin(&[2.0]).unwrap().is_nan());
        assert!(acos(&[-2.0]).unwrap().is_nan());
    }

    #[test]
    fn test_descriptors() {
        assert_eq!(SIN.name(), "sin");
        assert_eq!(SIN.arity(), 1);
        assert_eq!(ATAN2.arity(), 2);
        assert!(atan2(&[1.0]).is_err());
    }
}
