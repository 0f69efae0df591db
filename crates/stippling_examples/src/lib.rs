#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{
    init_tracing, load_density_image, render_stipples_to_png, DotStyle, RenderConfig,
};
