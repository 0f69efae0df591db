use std::time::Duration;

use criterion::{Criterion, Throughput};
use stippling::field::DensityField;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Radial falloff from the centre, dense in the middle.
pub fn radial_field(size: usize) -> DensityField {
    let c = size as f32 * 0.5;
    DensityField::from_fn(size, size, |x, y| {
        let dx = x as f32 - c;
        let dy = y as f32 - c;
        -(dx * dx + dy * dy).sqrt()
    })
    .expect("valid bench field")
}
