use log::debug;
use safe_eval_rs::ast::{validate, Compiler, Executor, Parser};
use safe_eval_rs::functions::registry;
use safe_eval_rs::Context;
use std::collections::HashSet;

fn main() {
    pretty_env_logger::init();

    let expression = "atan2(y, x) * 180 / pi";
    let ast = Parser::parse_expression(expression).expect("Failed to parse");
    println!("Parsed: {}", ast);

    let allowed: HashSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    let validated = validate(&ast, &allowed, registry()).expect("Failed to validate");
    println!("Variables: {:?}", validated.variables());

    let program = Compiler::compile(&validated);
    debug!("compiled: {program:?}");
    for instruction in program.instructions() {
        println!("  {:?}", instruction);
    }

    let mut executor = Executor::for_program(&program);
    for (x, y) in [(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (-1.0, 0.0)] {
        let context = Context::from([("x".to_string(), x), ("y".to_string(), y)]);
        match executor.execute(&program, registry(), &context) {
            Ok(result) => println!("angle({}, {}) = {}", x, y, result),
            Err(err) => println!("Error: {}", err),
        }
    }
}
