pub mod density;
pub mod percentile;
pub mod summary;

pub use density::{gaussian_kde, DensityEstimate, DensityMethod, DensityPoint, DENSITY_GRID_POINTS};
pub use summary::{
    invested_capital, invested_capital_curve, summarize, summarize_at_time, summarize_slice,
    DistributionSummary,
};
