use rand::rngs::StdRng;
use rand::SeedableRng;
use stippling::prelude::*;
use stippling_examples::{init_tracing, render_stipples_to_png, DotStyle, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (w, h) = (240, 120);
    let gradient = linear_gradient(w, h)?;
    // Five bands with a soft halo at each step, exaggerating the edges.
    let banded = gradient.mach_banding(5, 0.6, 6)?;

    let engine = StippleEngine::try_new(
        StippleConfig::new()
            .with_initial_stipple_radius(1.5)
            .with_max_iterations(50)
            .with_seed(7),
    )?
    .with_sampler(JitterGridSampling::new(0.8));

    let rc = RenderConfig::new((960, 480), gradient.extent())
        .with_dot(DotStyle::Fixed { radius: 1.5 });

    for (name, field) in [("gradient", &gradient), ("banded", &banded)] {
        let mut rng = StdRng::seed_from_u64(7);
        let result = engine.run(field, &mut rng);
        println!("{name}: {} stipples", result.stipples.len());
        render_stipples_to_png(&result.stipples, &rc, format!("functions-{name}.png"))?;
    }

    Ok(())
}
