use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::Normal;
use std::time::Instant;
use tracing::{info, warn};

use super::config::{ModelVariant, SimulationConfig, SimulationInput};
use super::paths::PathMatrix;
use crate::error::SimulationError;
use crate::types::{with_metadata, ComputationOutput};
use crate::SimulationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A completed simulation: the config it was run with and the path matrix.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub config: SimulationConfig,
    pub variant: ModelVariant,
    /// Seed of path 0; path `i` uses `base_seed + i`.
    pub base_seed: u64,
    pub paths: PathMatrix,
}

/// Produces one portfolio-value path on the config's time grid.
pub trait PathModel: Sync {
    fn simulate_path<R: Rng>(&self, config: &SimulationConfig, rng: &mut R) -> Vec<f64>;
}

/// GBM from the initial capital with no contributions along the way.
#[derive(Debug, Clone)]
pub struct SingleShotGbm {
    increments: Normal,
}

/// GBM restarted every contribution period from the previous end value plus
/// the contribution.
#[derive(Debug, Clone)]
pub struct PeriodicGbm {
    increments: Normal,
    /// Contribution columns of the config, shared by every path.
    boundaries: Vec<(usize, usize)>,
}

/// Path model selected from a config.
#[derive(Debug, Clone)]
pub enum PathGenerator {
    SingleShot(SingleShotGbm),
    Periodic(PeriodicGbm),
}

// ---------------------------------------------------------------------------
// Path models
// ---------------------------------------------------------------------------

/// Append `len` points of the closed-form GBM solution starting from `base`
/// at local times `0, dt, ..`, and return the value at local time `len * dt`.
///
/// The Wiener path starts at zero, so the first point is exactly `base`.
fn gbm_segment<R: Rng>(
    base: f64,
    len: usize,
    config: &SimulationConfig,
    increments: &Normal,
    rng: &mut R,
    out: &mut Vec<f64>,
) -> f64 {
    let log_drift = config.log_drift();
    let sigma = config.volatility();
    let dt = config.dt();

    let mut wiener = 0.0_f64;
    for k in 0..len {
        out.push(base * (log_drift * k as f64 * dt + sigma * wiener).exp());
        wiener += rng.sample(increments);
    }
    base * (log_drift * len as f64 * dt + sigma * wiener).exp()
}

impl PathModel for SingleShotGbm {
    fn simulate_path<R: Rng>(&self, config: &SimulationConfig, rng: &mut R) -> Vec<f64> {
        let mut path = Vec::with_capacity(config.num_steps());
        gbm_segment(
            config.initial_capital(),
            config.num_steps(),
            config,
            &self.increments,
            rng,
            &mut path,
        );
        path
    }
}

impl PathModel for PeriodicGbm {
    fn simulate_path<R: Rng>(&self, config: &SimulationConfig, rng: &mut R) -> Vec<f64> {
        let mut path = Vec::with_capacity(config.num_steps());
        let mut base = config.initial_capital();
        let mut start = 0;

        for &(column, added) in &self.boundaries {
            let end = gbm_segment(
                base,
                column - start,
                config,
                &self.increments,
                rng,
                &mut path,
            );
            // Contribution lands as a jump at the boundary; it never diffuses
            // within the period it was added in.
            base = end + config.contribution_amount() * added as f64;
            start = column;
        }

        // Last segment runs to the horizon. When the final contribution fell
        // on the grid this is the truncated trailing segment.
        gbm_segment(
            base,
            config.num_steps() - start,
            config,
            &self.increments,
            rng,
            &mut path,
        );

        path
    }
}

impl PathModel for PathGenerator {
    fn simulate_path<R: Rng>(&self, config: &SimulationConfig, rng: &mut R) -> Vec<f64> {
        match self {
            PathGenerator::SingleShot(model) => model.simulate_path(config, rng),
            PathGenerator::Periodic(model) => model.simulate_path(config, rng),
        }
    }
}

impl PathGenerator {
    /// Pick the path model for `config`: periodic when the contribution
    /// interval is shorter than the horizon.
    pub fn for_config(config: &SimulationConfig) -> SimulationResult<Self> {
        let increments =
            Normal::new(0.0, config.dt().sqrt()).map_err(|e| SimulationError::InvalidInput {
                field: "num_steps".into(),
                reason: format!("Invalid Wiener increment parameters: {e}"),
            })?;
        Ok(match config.variant() {
            ModelVariant::SingleShot => PathGenerator::SingleShot(SingleShotGbm { increments }),
            ModelVariant::Periodic => PathGenerator::Periodic(PeriodicGbm {
                increments,
                boundaries: config.contribution_columns(),
            }),
        })
    }

    /// Simulate every path. Path `i` draws from its own stream seeded with
    /// `base_seed + i`, so the result does not depend on thread scheduling.
    pub fn generate(&self, config: &SimulationConfig, base_seed: u64) -> PathMatrix {
        let simulate_one = |i: usize| {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
            self.simulate_path(config, &mut rng)
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = (0..config.num_simulations())
            .into_par_iter()
            .map(simulate_one)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..config.num_simulations()).map(simulate_one).collect();

        PathMatrix::from_rows(rows, config.num_steps())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the path matrix for a validated config.
///
/// Non-finite values (overflow under extreme `sigma * T`) do not fail the
/// run; they are reported as warnings and excluded later by the statistics.
pub fn generate_paths(
    config: SimulationConfig,
) -> SimulationResult<ComputationOutput<SimulationRun>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let generator = PathGenerator::for_config(&config)?;
    let base_seed = match config.seed() {
        Some(s) => s,
        None => StdRng::from_entropy().gen(),
    };

    let paths = generator.generate(&config, base_seed);

    let non_finite = paths.non_finite_paths();
    if non_finite > 0 {
        warn!(
            non_finite,
            num_simulations = config.num_simulations(),
            "simulated paths overflowed"
        );
        warnings.push(format!(
            "{non_finite} of {} paths contain non-finite values (overflow); \
             they are excluded from statistics",
            config.num_simulations()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        num_simulations = config.num_simulations(),
        num_steps = config.num_steps(),
        elapsed_us = elapsed,
        "simulation complete"
    );

    let assumptions = serde_json::json!({
        "time_horizon_years": config.horizon(),
        "num_steps": config.num_steps(),
        "dt": config.dt(),
        "annual_return": config.drift(),
        "annual_volatility": config.volatility(),
        "initial_capital": config.initial_capital(),
        "contribution_period_years": config.contribution_period(),
        "contribution_amount": config.contribution_amount(),
        "num_periods": config.num_periods(),
        "contributions_on_grid": config.contributions_made(config.num_steps() - 1),
        "trailing_steps": config.trailing_steps(),
        "num_simulations": config.num_simulations(),
        "seed": base_seed,
    });

    let run = SimulationRun {
        variant: config.variant(),
        base_seed,
        config,
        paths,
    };

    Ok(with_metadata(
        "Geometric Brownian motion with lump-sum periodic contributions",
        &assumptions,
        warnings,
        elapsed,
        run,
    ))
}

/// Validate user-unit input and generate its paths in one step.
pub fn simulate(input: &SimulationInput) -> SimulationResult<ComputationOutput<SimulationRun>> {
    generate_paths(SimulationConfig::from_input(input)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
