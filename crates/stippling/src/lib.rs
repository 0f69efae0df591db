#![forbid(unsafe_code)]
//! stippling: density-driven stippling via adaptive centroidal Voronoi relaxation.
//!
//! Modules:
//! - field: normalised density grids, synthetic and image sources, quantisation/banding
//! - geometry: polygon helpers and the clipped Voronoi tessellation adapter
//! - sampling: initial population placement (uniform random, jittered grid)
//! - stipple: relaxation step, convergence engine, config, events
//! - worker: background thread streaming progress snapshots
//!
//! For examples and docs, see README and docs.rs.
pub mod error;
pub mod field;
pub mod geometry;
pub mod sampling;
pub mod stipple;
pub mod worker;

/// Convenient re-exports for common types. Import with `use stippling::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::field::sources::{
        eggholder, from_rgba, grayscale, hot_spot, inverted_grayscale, linear_gradient,
        rastrigin,
    };
    pub use crate::field::DensityField;
    pub use crate::geometry::{Bounds, Tessellation};
    pub use crate::sampling::{JitterGridSampling, PositionSampling, UniformRandomSampling};
    pub use crate::stipple::config::StippleConfig;
    pub use crate::stipple::events::{
        ChannelSink, EventSink, FilterSink, FnSink, MultiSink, Snapshot, StippleEvent,
        StippleEventKind, VecSink,
    };
    pub use crate::stipple::relax::{relax, IterationStats, Thresholds};
    pub use crate::stipple::runner::{
        run_stippling, ConvergenceReason, EngineState, StippleEngine, StippleResult, StippleRun,
    };
    pub use crate::stipple::{normalize_stipples, Stipple};
    pub use crate::worker::{FromWorker, StippleRequest, StippleWorker, ToWorker};
}
