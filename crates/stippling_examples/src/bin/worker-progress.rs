use stippling::prelude::*;
use stippling_examples::{init_tracing, render_stipples_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let field = eggholder(160, 160)?;
    let extent = field.extent();

    let config = StippleConfig::new()
        .with_initial_stipple_radius(1.8)
        .with_convergence_rate(0.02)
        .with_max_iterations(40)
        .with_seed(99);
    let mut worker = StippleWorker::spawn(StippleRequest::new(field, config))?;

    let rc = RenderConfig::new((640, 640), extent);
    for message in worker.iter() {
        let snapshot = message.snapshot();
        println!(
            "[{:>5.1}%] iteration {:>3}: {} stipples",
            snapshot.progress,
            snapshot.iteration,
            snapshot.stipples.len()
        );
        if snapshot.iteration % 10 == 0 || message.is_done() {
            let out = format!("worker-progress-{:03}.png", snapshot.iteration);
            render_stipples_to_png(&snapshot.stipples, &rc, out)?;
        }
    }

    Ok(())
}
