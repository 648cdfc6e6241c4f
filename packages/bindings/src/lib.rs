use napi::Result;
use napi_derive::napi;

use portfolio_sim_core::simulation::{self, SimulationInput, SimulationRun, TimeIndexMapper};
use portfolio_sim_core::statistics;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A simulated path matrix held on the Rust side, queried by time index
/// from the dashboard.
#[napi]
pub struct PortfolioSimulation {
    run: SimulationRun,
    warnings: Vec<String>,
}

#[napi]
impl PortfolioSimulation {
    /// Validate the input JSON and run the simulation once.
    #[napi(constructor)]
    pub fn new(input_json: String) -> Result<Self> {
        let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
        let output = simulation::simulate(&input).map_err(to_napi_error)?;
        Ok(PortfolioSimulation {
            run: output.result,
            warnings: output.warnings,
        })
    }

    /// Warnings raised while generating the paths.
    #[napi]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }

    /// Grid column for a time in years, clamped onto the grid.
    #[napi]
    pub fn index_for_time(&self, years: f64) -> u32 {
        TimeIndexMapper::new(&self.run.config).index_for_time(years) as u32
    }

    #[napi]
    pub fn summary_at_index(&self, index: u32) -> Result<String> {
        let output = statistics::summarize(&self.run, index as usize).map_err(to_napi_error)?;
        serde_json::to_string(&output).map_err(to_napi_error)
    }

    #[napi]
    pub fn summary_at_time(&self, years: f64) -> Result<String> {
        let output = statistics::summarize_at_time(&self.run, years).map_err(to_napi_error)?;
        serde_json::to_string(&output).map_err(to_napi_error)
    }

    /// Every path as an array of rows, plus the time grid.
    #[napi]
    pub fn paths_json(&self) -> Result<String> {
        let mapper = TimeIndexMapper::new(&self.run.config);
        let rows: Vec<&[f64]> = self.run.paths.rows().collect();
        serde_json::to_string(&serde_json::json!({
            "time_years": mapper.grid(),
            "paths": rows,
        }))
        .map_err(to_napi_error)
    }

    #[napi]
    pub fn invested_capital_json(&self) -> Result<String> {
        serde_json::to_string(&statistics::invested_capital_curve(&self.run.config))
            .map_err(to_napi_error)
    }
}
