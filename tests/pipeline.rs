//! End-to-end behaviour of constructed evaluators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use safe_eval_rs::{
    evaluate_expression, ConstructionError, Context, EvaluationError, FormulaCache,
    NumericPolicy, SafeEvaluator, SyntaxError,
};
use std::sync::Arc;

fn context(pairs: &[(&str, f64)]) -> Context {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn random_context(rng: &mut StdRng, names: &[&str]) -> Context {
    names
        .iter()
        .map(|name| (name.to_string(), rng.random_range(-100.0_f64..100.0)))
        .collect()
}

fn same_value(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

#[test]
fn test_reference_formulas() {
    let evaluator = SafeEvaluator::new("sin(pi/2)+1", Vec::<String>::new()).unwrap();
    assert_eq!(evaluator.evaluate(&Context::new()), Ok(2.0));

    let evaluator = SafeEvaluator::new("x + y", ["x", "y"]).unwrap();
    assert_eq!(evaluator.evaluate(&context(&[("x", 1.0), ("y", 2.0)])), Ok(3.0));

    let evaluator = SafeEvaluator::new("2**3", Vec::<String>::new()).unwrap();
    assert_eq!(evaluator.evaluate(&Context::new()), Ok(8.0));
}

#[test]
fn test_matches_native_arithmetic() {
    let evaluator = SafeEvaluator::new("x + y*lc", ["x", "y", "lc"]).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let bindings = random_context(&mut rng, &["x", "y", "lc"]);
        let expected = bindings["x"] + bindings["y"] * bindings["lc"];
        assert_eq!(evaluator.evaluate(&bindings), Ok(expected));
    }
}

#[test]
fn test_precedence_and_associativity() {
    let cases = [
        ("1 + 2 * 3", 7.0),
        ("(1 + 2) * 3", 9.0),
        ("2 ** 3 ** 2", 512.0),
        ("-2 ** 2", -4.0),
        ("2 ** -1", 0.5),
        ("10 - 4 - 3", 3.0),
        ("-7 % 3", 2.0),
        ("7 % -3", -2.0),
        ("--3", 3.0),
        ("+4 / 2", 2.0),
        ("fabs(-2.5) + sqrt(16)", 6.5),
        ("atan2(0, -1)", std::f64::consts::PI),
        ("tau / 2", std::f64::consts::PI),
        ("exp(0) + log(1) + fabs(-1)", 2.0),
    ];
    for (expression, expected) in cases {
        let evaluator = SafeEvaluator::new(expression, Vec::<String>::new()).unwrap();
        assert_eq!(
            evaluator.evaluate(&Context::new()),
            Ok(expected),
            "{}",
            expression
        );
    }
}

#[test]
fn test_boundary_inputs() {
    let zero = SafeEvaluator::new("0", Vec::<String>::new()).unwrap();
    assert_eq!(zero.evaluate(&Context::new()), Ok(0.0));

    for input in ["", "   ", "\n\t"] {
        assert_eq!(
            SafeEvaluator::new(input, Vec::<String>::new()).unwrap_err(),
            ConstructionError::Syntax(SyntaxError {
                position: 0,
                fragment: String::new(),
                message: "empty expression".to_string(),
            })
        );
    }
}

#[test]
fn test_context_binding_rules() {
    let evaluator = SafeEvaluator::new("x + y", ["x", "y", "unused"]).unwrap();

    // Extra keys that are not registry names are ignored.
    let bindings = context(&[("x", 1.0), ("y", 2.0), ("other", 5.0)]);
    assert_eq!(evaluator.evaluate(&bindings), Ok(3.0));

    assert_eq!(
        evaluator.evaluate(&context(&[("x", 1.0)])),
        Err(EvaluationError::MissingVariable("y".to_string()))
    );
}

#[test]
fn test_ieee_semantics_by_default() {
    let evaluator = SafeEvaluator::new("a / b", ["a", "b"]).unwrap();
    assert_eq!(
        evaluator.evaluate(&context(&[("a", 1.0), ("b", 0.0)])),
        Ok(f64::INFINITY)
    );
    assert!(evaluator
        .evaluate(&context(&[("a", 0.0), ("b", 0.0)]))
        .unwrap()
        .is_nan());

    let evaluator = SafeEvaluator::new("sqrt(-1)", Vec::<String>::new()).unwrap();
    assert!(evaluator.evaluate(&Context::new()).unwrap().is_nan());
}

#[test]
fn test_strict_policy_rejects_non_finite() {
    let evaluator = SafeEvaluator::builder("log(x)")
        .allow_variable("x")
        .numeric_policy(NumericPolicy::RejectNonFinite)
        .build()
        .unwrap();
    assert_eq!(
        evaluator.evaluate(&context(&[("x", 0.0)])),
        Err(EvaluationError::NonFiniteResult(f64::NEG_INFINITY))
    );
    assert_eq!(evaluator.evaluate(&context(&[("x", 1.0)])), Ok(0.0));
}

#[test]
fn test_repeated_evaluation_is_deterministic() {
    let expression = "x * sin(y) - atan2(x, y) % 3 + sqrt(fabs(x)) / (1 + y ** 2)";
    let first = SafeEvaluator::new(expression, ["x", "y"]).unwrap();
    let second = SafeEvaluator::new(expression, ["y", "x"]).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let bindings = random_context(&mut rng, &["x", "y"]);
        let value = first.evaluate(&bindings).unwrap();
        assert!(same_value(value, first.evaluate(&bindings).unwrap()));
        assert!(same_value(value, second.evaluate(&bindings).unwrap()));
    }
}

#[test]
fn test_backends_agree() {
    let expressions = [
        "x + y*lc",
        "-x ** 2 % lc",
        "atan2(y, x) * tau - exp(lc / 50)",
        "log(fabs(x) + 1) / log10(fabs(y) + 2) ** -lc",
        "cos(x) ** 2 + sin(x) ** 2",
        "tan(asin(lc / 100) + acos(y / 100))",
        "x / (y - y)",
    ];
    let mut rng = StdRng::seed_from_u64(1234);
    for expression in expressions {
        let evaluator = SafeEvaluator::new(expression, ["x", "y", "lc"]).unwrap();
        for _ in 0..100 {
            let bindings = random_context(&mut rng, &["x", "y", "lc"]);
            let compiled = evaluator.evaluate(&bindings).unwrap();
            let walked = evaluator.evaluate_tree(&bindings).unwrap();
            assert!(
                same_value(compiled, walked),
                "{}: {} != {}",
                expression,
                compiled,
                walked
            );
        }
    }
}

#[test]
fn test_batch_matches_sequential() {
    let evaluator = SafeEvaluator::new("x ** 2 + y", ["x", "y"]).unwrap();
    let mut rng = rand::rng();
    let contexts: Vec<Context> = (0..1000)
        .map(|_| {
            context(&[
                ("x", rng.random_range(-10.0_f64..10.0)),
                ("y", rng.random_range(-10.0_f64..10.0)),
            ])
        })
        .collect();

    let batch = evaluator.evaluate_batch(&contexts);
    assert_eq!(batch.len(), contexts.len());
    for (bindings, result) in contexts.iter().zip(batch) {
        assert_eq!(result, evaluator.evaluate(bindings));
    }

    let mut contexts = contexts;
    contexts[3] = context(&[("x", 1.0)]);
    let batch = evaluator.evaluate_batch(&contexts);
    assert_eq!(
        batch[3],
        Err(EvaluationError::MissingVariable("y".to_string()))
    );
}

#[test]
fn test_shared_across_threads() {
    let evaluator = Arc::new(SafeEvaluator::new("t * 3 + 1", ["t"]).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let evaluator = Arc::clone(&evaluator);
            std::thread::spawn(move || {
                (0..250)
                    .map(|step| {
                        let t = (worker * 250 + step) as f64;
                        evaluator.evaluate(&context(&[("t", t)])) == Ok(t * 3.0 + 1.0)
                    })
                    .all(|ok| ok)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_formula_cache_reuses_evaluators() {
    let cache = FormulaCache::new(8);
    let formulas = ["mass * 0.5", "mass * 0.5 ", "length ** 2"];
    let evaluators: Vec<_> = formulas
        .iter()
        .map(|formula| cache.get_or_build(formula, ["mass", "length"]).unwrap())
        .collect();
    assert!(Arc::ptr_eq(&evaluators[0], &evaluators[1]));
    assert_eq!(cache.len(), 2);
    assert_eq!(
        evaluators[2].evaluate(&context(&[("length", 3.0)])),
        Ok(9.0)
    );
}

#[test]
fn test_one_shot_helper() {
    assert_eq!(
        evaluate_expression("x + y", &context(&[("x", 1.0), ("y", 2.0)])),
        Ok(3.0)
    );
    assert!(evaluate_expression("import os", &Context::new()).is_err());
}
