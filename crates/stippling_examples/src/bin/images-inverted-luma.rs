use rand::rngs::StdRng;
use rand::SeedableRng;
use stippling::prelude::*;
use stippling_examples::{init_tracing, load_density_image, render_stipples_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let Some(path) = std::env::args().nth(1) else {
        anyhow::bail!("usage: images-inverted-luma <image.png> [radius]");
    };
    let radius: f64 = match std::env::args().nth(2) {
        Some(r) => r.parse()?,
        None => 2.0,
    };

    // Dark pixels attract ink.
    let field = load_density_image(&path, inverted_grayscale)?;
    let config = StippleConfig::new()
        .with_initial_stipple_radius(radius)
        .with_max_iterations(80);
    let mut rng = StdRng::seed_from_u64(1);
    let result = run_stippling(&field, config, &mut rng, None)?;

    let scale = 4;
    let rc = RenderConfig::new(
        (field.width() as u32 * scale, field.height() as u32 * scale),
        field.extent(),
    );
    render_stipples_to_png(&result.stipples, &rc, "images-inverted-luma.png")?;

    Ok(())
}
