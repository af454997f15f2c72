use safe_eval_rs::{Context, SafeEvaluator};

fn main() {
    pretty_env_logger::init();

    let evaluator = SafeEvaluator::new("sin(pi / 2) + x * lc", ["x", "lc"])
        .expect("Failed to construct evaluator");

    let context: Context = [("x".to_string(), 2.0), ("lc".to_string(), 0.25)]
        .iter()
        .cloned()
        .collect();

    match evaluator.evaluate(&context) {
        Ok(result) => println!("Result: {}", result),
        Err(err) => println!("Error: {}", err),
    }

    for hostile in ["import os", "__import__('os').system('ls')", "math.sin(0)", "2^3"] {
        match SafeEvaluator::new(hostile, ["x"]) {
            Ok(_) => println!("{:?} was accepted", hostile),
            Err(err) => println!("{:?} rejected: {}", hostile, err),
        }
    }
}
