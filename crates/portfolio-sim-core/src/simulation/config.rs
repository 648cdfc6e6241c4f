use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimulationError;
use crate::types::{Money, Rate, Years};
use crate::SimulationResult;

/// Relative tolerance used when turning ratios of horizons into integer counts.
const RATIO_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw simulation parameters, in the units a user types them in.
///
/// Rates are percentages and the contribution interval is in months; both are
/// converted when a [`SimulationConfig`] is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(default = "default_time_horizon_years")]
    pub time_horizon_years: f64,
    #[serde(default = "default_annual_return_pct")]
    pub annual_return_pct: f64,
    #[serde(default = "default_annual_volatility_pct")]
    pub annual_volatility_pct: f64,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_contribution_interval_months")]
    pub contribution_interval_months: f64,
    #[serde(default = "default_contribution_amount")]
    pub contribution_amount: f64,
    /// Number of time steps on the simulation grid.
    #[serde(default = "default_num_steps")]
    pub num_steps: u32,
    /// Number of independent paths.
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_time_horizon_years() -> f64 {
    10.0
}

fn default_annual_return_pct() -> f64 {
    8.33
}

fn default_annual_volatility_pct() -> f64 {
    10.87
}

fn default_initial_capital() -> f64 {
    28_000.0
}

fn default_contribution_interval_months() -> f64 {
    1.0
}

fn default_contribution_amount() -> f64 {
    500.0
}

pub const DEFAULT_NUM_STEPS: u32 = 2520;
pub const DEFAULT_NUM_SIMULATIONS: u32 = 500;

fn default_num_steps() -> u32 {
    DEFAULT_NUM_STEPS
}

fn default_num_simulations() -> u32 {
    DEFAULT_NUM_SIMULATIONS
}

impl Default for SimulationInput {
    fn default() -> Self {
        SimulationInput {
            time_horizon_years: default_time_horizon_years(),
            annual_return_pct: default_annual_return_pct(),
            annual_volatility_pct: default_annual_volatility_pct(),
            initial_capital: default_initial_capital(),
            contribution_interval_months: default_contribution_interval_months(),
            contribution_amount: default_contribution_amount(),
            num_steps: DEFAULT_NUM_STEPS,
            num_simulations: DEFAULT_NUM_SIMULATIONS,
            seed: None,
        }
    }
}

/// The six scalar fields of an entry form, as raw text.
#[derive(Debug, Clone, Copy)]
pub struct TextFields<'a> {
    pub time_horizon_years: &'a str,
    pub annual_return_pct: &'a str,
    pub annual_volatility_pct: &'a str,
    pub initial_capital: &'a str,
    pub contribution_interval_months: &'a str,
    pub contribution_amount: &'a str,
}

/// Which path model a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVariant {
    /// The contribution interval covers the whole horizon: plain GBM from `S0`.
    SingleShot,
    /// Contributions are added as lump sums at each period boundary.
    Periodic,
}

/// Validated, immutable simulation parameters with derived grid quantities.
///
/// Only serialisable: the sole way in is through validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    horizon: Years,
    num_steps: usize,
    dt: Years,
    drift: Rate,
    volatility: Rate,
    initial_capital: Money,
    contribution_period: Years,
    contribution_amount: Money,
    num_simulations: usize,
    seed: Option<u64>,
    num_periods: usize,
    variant: ModelVariant,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_field(field: &str, raw: &str) -> SimulationResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| SimulationError::invalid(field, format!("'{raw}' is not a valid number")))
}

impl SimulationInput {
    /// Parse the six user-entered scalars from text, keeping the engineering
    /// constants at their defaults.
    pub fn from_text_fields(fields: TextFields<'_>) -> SimulationResult<Self> {
        Ok(SimulationInput {
            time_horizon_years: parse_field("time_horizon_years", fields.time_horizon_years)?,
            annual_return_pct: parse_field("annual_return_pct", fields.annual_return_pct)?,
            annual_volatility_pct: parse_field(
                "annual_volatility_pct",
                fields.annual_volatility_pct,
            )?,
            initial_capital: parse_field("initial_capital", fields.initial_capital)?,
            contribution_interval_months: parse_field(
                "contribution_interval_months",
                fields.contribution_interval_months,
            )?,
            contribution_amount: parse_field("contribution_amount", fields.contribution_amount)?,
            ..SimulationInput::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn require_finite(field: &str, value: f64) -> SimulationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::invalid(field, "Must be a finite number"))
    }
}

/// `floor(x)` that tolerates `x` landing a hair below an integer.
fn tolerant_floor(x: f64) -> f64 {
    (x * (1.0 + RATIO_TOLERANCE)).floor()
}


impl SimulationConfig {
    /// Build a config from user-unit input: percentages become fractions and
    /// the contribution interval is converted from months to years.
    pub fn from_input(input: &SimulationInput) -> SimulationResult<Self> {
        require_finite("annual_return_pct", input.annual_return_pct)?;
        require_finite("annual_volatility_pct", input.annual_volatility_pct)?;
        require_finite(
            "contribution_interval_months",
            input.contribution_interval_months,
        )?;
        Self::new(
            input.time_horizon_years,
            input.num_steps,
            input.annual_return_pct / 100.0,
            input.annual_volatility_pct / 100.0,
            input.initial_capital,
            input.contribution_interval_months / 12.0,
            input.contribution_amount,
            input.num_simulations,
            input.seed,
        )
    }

    /// Build a config from model units: fractional rates, period in years.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        horizon: Years,
        num_steps: u32,
        drift: Rate,
        volatility: Rate,
        initial_capital: Money,
        contribution_period: Years,
        contribution_amount: Money,
        num_simulations: u32,
        seed: Option<u64>,
    ) -> SimulationResult<Self> {
        require_finite("time_horizon_years", horizon)?;
        require_finite("annual_return", drift)?;
        require_finite("annual_volatility", volatility)?;
        require_finite("initial_capital", initial_capital)?;
        require_finite("contribution_interval", contribution_period)?;
        require_finite("contribution_amount", contribution_amount)?;

        if horizon <= 0.0 {
            return Err(SimulationError::invalid(
                "time_horizon_years",
                "Must be greater than zero",
            ));
        }
        if num_steps == 0 {
            return Err(SimulationError::invalid("num_steps", "Must be at least 1"));
        }
        if num_simulations == 0 {
            return Err(SimulationError::invalid(
                "num_simulations",
                "Must be at least 1",
            ));
        }
        if volatility < 0.0 {
            return Err(SimulationError::invalid(
                "annual_volatility",
                "Must not be negative",
            ));
        }
        if initial_capital < 0.0 {
            return Err(SimulationError::invalid(
                "initial_capital",
                "Must not be negative",
            ));
        }
        if contribution_period <= 0.0 {
            return Err(SimulationError::invalid(
                "contribution_interval",
                "Must be greater than zero",
            ));
        }
        if contribution_amount < 0.0 {
            return Err(SimulationError::invalid(
                "contribution_amount",
                "Must not be negative",
            ));
        }

        let num_steps = num_steps as usize;
        let dt = horizon / num_steps as f64;

        let variant = if contribution_period >= horizon {
            ModelVariant::SingleShot
        } else {
            ModelVariant::Periodic
        };

        let num_periods = match variant {
            ModelVariant::SingleShot => 1,
            ModelVariant::Periodic => tolerant_floor(horizon / contribution_period) as usize,
        };

        debug!(?variant, horizon, dt, num_periods, "derived simulation grid");

        Ok(SimulationConfig {
            horizon,
            num_steps,
            dt,
            drift,
            volatility,
            initial_capital,
            contribution_period,
            contribution_amount,
            num_simulations: num_simulations as usize,
            seed,
            num_periods,
            variant,
        })
    }

    pub fn horizon(&self) -> Years {
        self.horizon
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn dt(&self) -> Years {
        self.dt
    }

    pub fn drift(&self) -> Rate {
        self.drift
    }

    pub fn volatility(&self) -> Rate {
        self.volatility
    }

    pub fn initial_capital(&self) -> Money {
        self.initial_capital
    }

    pub fn contribution_period(&self) -> Years {
        self.contribution_period
    }

    pub fn contribution_amount(&self) -> Money {
        self.contribution_amount
    }

    pub fn num_simulations(&self) -> usize {
        self.num_simulations
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of full contribution periods in the horizon, `floor(T/P)`.
    /// The single-shot variant counts the whole horizon as one segment.
    pub fn num_periods(&self) -> usize {
        self.num_periods
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Log-drift per year, `mu - sigma^2 / 2`.
    pub fn log_drift(&self) -> f64 {
        self.drift - 0.5 * self.volatility * self.volatility
    }

    /// Number of contributions made on or before grid column `index`:
    /// `floor(index * dt / P)`, capped at `floor(T/P)`. Contribution `j` lands
    /// at time `j * P`, so it first shows at the column at or after that time.
    /// Always zero for the single-shot variant.
    pub fn contributions_made(&self, index: usize) -> usize {
        match self.variant {
            ModelVariant::SingleShot => 0,
            ModelVariant::Periodic => {
                let elapsed = index as f64 * self.dt / self.contribution_period;
                (tolerant_floor(elapsed) as usize).min(self.num_periods)
            }
        }
    }

    /// Grid columns where contributions land, with how many land there.
    ///
    /// Boundaries sit at absolute times `j * P`, so segment lengths vary by a
    /// column when `P` is not a whole number of steps. Several contributions
    /// share a column when `P < dt`.
    pub fn contribution_columns(&self) -> Vec<(usize, usize)> {
        (1..self.num_steps)
            .filter_map(|k| {
                let added = self.contributions_made(k) - self.contributions_made(k - 1);
                (added > 0).then_some((k, added))
            })
            .collect()
    }

    /// Columns after the last contribution that lands on the grid. These form
    /// the truncated trailing segment; no contribution follows it.
    pub fn trailing_steps(&self) -> usize {
        match self.contribution_columns().last() {
            Some(&(column, _)) if self.contributions_made(column) == self.num_periods => {
                self.num_steps - column
            }
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
