use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::density::{gaussian_kde, DensityEstimate, DENSITY_GRID_POINTS};
use super::percentile::{mean, SortedSample};
use crate::error::SimulationError;
use crate::simulation::{SimulationConfig, SimulationRun, TimeIndexMapper, TimeLabel, TimeSlice};
use crate::types::{with_metadata, ComputationOutput, Money, Years};
use crate::SimulationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cross-sectional statistics of all simulated paths at one grid column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub index: usize,
    pub time_years: Years,
    pub label: TimeLabel,
    pub mean: Money,
    pub percentile_5: Money,
    pub percentile_95: Money,
    /// Principal contributed up to this column, independent of returns.
    pub invested_capital: Money,
    pub density: DensityEstimate,
    /// Number of finite values the statistics were computed from.
    pub sample_size: usize,
    pub excluded_non_finite: usize,
}

// ---------------------------------------------------------------------------
// Invested capital
// ---------------------------------------------------------------------------

/// `S0 + s * floor(t / P)` at grid column `index`, counting at most
/// `floor(T / P)` contributions; `S0` for the single-shot variant.
pub fn invested_capital(config: &SimulationConfig, index: usize) -> Money {
    config.initial_capital()
        + config.contribution_amount() * config.contributions_made(index) as f64
}

/// Invested capital at every grid column.
pub fn invested_capital_curve(config: &SimulationConfig) -> Vec<Money> {
    (0..config.num_steps())
        .map(|k| invested_capital(config, k))
        .collect()
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Summarise an already extracted time slice.
///
/// Non-finite values are dropped with a warning. A slice with no finite
/// values at all is a `NumericOverflow` error; fewer than two values or zero
/// spread fall back to a degenerate result and never fail.
pub fn summarize_slice(
    slice: TimeSlice,
    config: &SimulationConfig,
) -> SimulationResult<(DistributionSummary, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    let total = slice.values.len();
    let (sample, excluded_non_finite) = SortedSample::from_finite(slice.values);

    let (Some(percentile_5), Some(percentile_95)) = (sample.quantile(0.05), sample.quantile(0.95))
    else {
        return Err(SimulationError::NumericOverflow(format!(
            "No finite portfolio values at index {} ({total} paths overflowed)",
            slice.index
        )));
    };
    if excluded_non_finite > 0 {
        warn!(
            index = slice.index,
            excluded_non_finite, "excluding non-finite values from slice"
        );
        warnings.push(format!(
            "{excluded_non_finite} of {total} values at index {} are non-finite and were excluded",
            slice.index
        ));
    }

    let values = sample.values();
    let n = values.len();
    let mean_value = mean(values);
    let density = gaussian_kde(values, DENSITY_GRID_POINTS);

    if n < 2 {
        warnings.push(
            "Only one simulated value: percentiles equal that value and the density is a synthetic spike"
                .into(),
        );
    } else if density.is_degenerate() {
        debug!(index = slice.index, "zero-spread slice, using spike density");
        warnings.push(
            "All simulated values are identical at this time: the density is a synthetic spike"
                .into(),
        );
    }

    let mapper = TimeIndexMapper::new(config);
    let summary = DistributionSummary {
        index: slice.index,
        time_years: slice.time_years,
        label: mapper.label_for_index(slice.index),
        mean: mean_value,
        percentile_5,
        percentile_95,
        invested_capital: invested_capital(config, slice.index),
        density,
        sample_size: n,
        excluded_non_finite,
    };
    Ok((summary, warnings))
}

/// Summarise the distribution of portfolio values at grid column `index`.
pub fn summarize(
    run: &SimulationRun,
    index: usize,
) -> SimulationResult<ComputationOutput<DistributionSummary>> {
    let start = Instant::now();
    let config = &run.config;

    let slice = run
        .paths
        .slice(index, config.dt())
        .ok_or_else(|| SimulationError::InvalidInput {
            field: "index".into(),
            reason: format!(
                "Must be below the number of steps ({}), got {index}",
                run.paths.num_steps()
            ),
        })?;

    let (summary, warnings) = summarize_slice(slice, config)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cross-sectional mean, linear-interpolation percentiles and Gaussian KDE (Scott's rule)",
        &serde_json::json!({
            "index": index,
            "num_simulations": run.paths.num_paths(),
            "percentiles": [5, 95],
            "density_grid_points": DENSITY_GRID_POINTS,
            "seed": run.base_seed,
        }),
        warnings,
        elapsed,
        summary,
    ))
}

/// Summarise at a continuous time in years, clamped onto the grid.
pub fn summarize_at_time(
    run: &SimulationRun,
    time: Years,
) -> SimulationResult<ComputationOutput<DistributionSummary>> {
    let index = TimeIndexMapper::new(&run.config).index_for_time(time);
    summarize(run, index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
