use rand::rngs::StdRng;
use rand::SeedableRng;
use stippling::prelude::*;
use stippling_examples::{init_tracing, render_stipples_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (w, h) = (200, 200);
    let field = rastrigin(w, h)?;

    let config = StippleConfig::new()
        .with_initial_stipple_radius(2.0)
        .with_convergence_rate(0.01)
        .with_max_iterations(60);

    let engine = StippleEngine::try_new(config)?;
    let mut rng = StdRng::seed_from_u64(2025);
    let result = engine.run(&field, &mut rng);

    println!(
        "{} stipples after {} iterations ({:?})",
        result.stipples.len(),
        result.iterations,
        result.reason
    );

    let rc = RenderConfig::new((800, 800), field.extent());
    render_stipples_to_png(&result.stipples, &rc, "functions-rastrigin.png")?;

    Ok(())
}
