use safe_eval_rs::{Context, FormulaCache};

fn main() {
    pretty_env_logger::init();

    // One link length per step of a parameter sweep.
    let contexts: Vec<Context> = (0..8)
        .map(|step| {
            Context::from([
                ("length".to_string(), 0.1 * (step + 1) as f64),
                ("radius".to_string(), 0.02),
                ("density".to_string(), 2700.0),
            ])
        })
        .collect();

    let cache = FormulaCache::new(16);
    let mass = cache
        .get_or_build("density * pi * radius ** 2 * length", ["length", "radius", "density"])
        .expect("Failed to construct evaluator");
    let inertia = cache
        .get_or_build("mass * length ** 2 / 12", ["mass", "length"])
        .expect("Failed to construct evaluator");

    for (i, result) in mass.evaluate_batch(&contexts).into_iter().enumerate() {
        let Ok(value) = result else {
            println!("Step {}: {:?}", i, result);
            continue;
        };
        let mut context = contexts[i].clone();
        context.insert("mass".to_string(), value);
        // Unreferenced keys such as radius and density are ignored.
        println!(
            "Step {}: mass = {:.4}, inertia = {:?}",
            i,
            value,
            inertia.evaluate(&context)
        );
    }
}
