use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use portfolio_sim_core::simulation::{
    self, thinned_columns, SimulationInput, SimulationRun, TimeIndexMapper,
};
use portfolio_sim_core::statistics::{self, invested_capital_curve};
use portfolio_sim_core::ComputationOutput;

use crate::input;

/// Simulation parameters shared by every command. Flags override the
/// corresponding fields of the input document.
#[derive(Args)]
pub struct SimulationArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Time horizon in years
    #[arg(long)]
    pub years: Option<f64>,

    /// Expected annual return in percent (e.g. 8.33)
    #[arg(long, allow_hyphen_values = true)]
    pub return_pct: Option<f64>,

    /// Annual volatility in percent (e.g. 10.87)
    #[arg(long)]
    pub volatility_pct: Option<f64>,

    /// Initial capital
    #[arg(long)]
    pub initial_capital: Option<f64>,

    /// Contribution interval in months
    #[arg(long)]
    pub interval_months: Option<f64>,

    /// Amount contributed at every interval
    #[arg(long)]
    pub contribution: Option<f64>,

    /// Number of grid steps
    #[arg(long)]
    pub steps: Option<u32>,

    /// Number of simulated paths
    #[arg(long)]
    pub sims: Option<u32>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for distribution summaries
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Time in years to summarise at; repeatable. Defaults to the horizon.
    #[arg(long = "at", allow_hyphen_values = true)]
    pub at: Vec<f64>,

    /// Grid column to summarise at; repeatable.
    #[arg(long = "index")]
    pub index: Vec<usize>,

    /// Include the 500-point density curve in the output
    #[arg(long)]
    pub with_density: bool,
}

/// Arguments for dumping simulated trajectories
#[derive(Args)]
pub struct PathsArgs {
    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Keep every N-th grid column (the last column is always kept)
    #[arg(long, default_value = "21")]
    pub every: usize,
}

#[derive(Debug, Serialize)]
struct PathsReport {
    time_years: Vec<f64>,
    invested_capital: Vec<f64>,
    paths: Vec<Vec<f64>>,
}

fn load_input(args: &SimulationArgs) -> Result<SimulationInput, Box<dyn std::error::Error>> {
    let mut sim_input: SimulationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_input()? {
        piped
    } else {
        SimulationInput::default()
    };

    if let Some(v) = args.years {
        sim_input.time_horizon_years = v;
    }
    if let Some(v) = args.return_pct {
        sim_input.annual_return_pct = v;
    }
    if let Some(v) = args.volatility_pct {
        sim_input.annual_volatility_pct = v;
    }
    if let Some(v) = args.initial_capital {
        sim_input.initial_capital = v;
    }
    if let Some(v) = args.interval_months {
        sim_input.contribution_interval_months = v;
    }
    if let Some(v) = args.contribution {
        sim_input.contribution_amount = v;
    }
    if let Some(v) = args.steps {
        sim_input.num_steps = v;
    }
    if let Some(v) = args.sims {
        sim_input.num_simulations = v;
    }
    if args.seed.is_some() {
        sim_input.seed = args.seed;
    }

    debug!(?sim_input, "resolved simulation input");
    Ok(sim_input)
}

fn summary_value(
    output: ComputationOutput<statistics::DistributionSummary>,
    with_density: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = serde_json::to_value(output)?;
    if !with_density {
        if let Some(density) = value.pointer_mut("/result/density") {
            if let Some(obj) = density.as_object_mut() {
                obj.remove("points");
            }
        }
    }
    Ok(value)
}

fn requested_indices(args: &SummaryArgs, run: &SimulationRun) -> Vec<usize> {
    let mapper = TimeIndexMapper::new(&run.config);
    let mut indices: Vec<usize> = args
        .at
        .iter()
        .map(|&t| mapper.index_for_time(t))
        .chain(args.index.iter().copied())
        .collect();
    if indices.is_empty() {
        indices.push(mapper.last_index());
    }
    indices
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = load_input(&args.simulation)?;
    let run_output = simulation::simulate(&sim_input)?;
    let run = &run_output.result;

    let mut summaries = Vec::new();
    for index in requested_indices(&args, run) {
        let mut out = statistics::summarize(run, index)?;
        // Generation warnings apply to every slice.
        let mut warnings = run_output.warnings.clone();
        warnings.append(&mut out.warnings);
        out.warnings = warnings;
        summaries.push(summary_value(out, args.with_density)?);
    }

    if summaries.len() == 1 {
        Ok(summaries.remove(0))
    } else {
        let results: Vec<Value> = summaries
            .into_iter()
            .filter_map(|mut v| v.get_mut("result").map(Value::take))
            .collect();
        Ok(json!({
            "results": results,
            "warnings": run_output.warnings,
            "assumptions": run_output.assumptions,
        }))
    }
}

pub fn run_paths(args: PathsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input = load_input(&args.simulation)?;
    let run_output = simulation::simulate(&sim_input)?;
    let run = &run_output.result;

    // Thin the grid and the invested-capital curve with the same column set.
    let mapper = TimeIndexMapper::new(&run.config);
    let columns = thinned_columns(run.paths.num_steps(), args.every);
    let curve = invested_capital_curve(&run.config);

    let report = PathsReport {
        time_years: columns.iter().map(|&k| mapper.time_at_index(k)).collect(),
        invested_capital: columns.iter().map(|&k| curve[k]).collect(),
        paths: run
            .paths
            .thinned(args.every)
            .rows()
            .map(|row| row.to_vec())
            .collect(),
    };

    Ok(json!({
        "result": serde_json::to_value(report)?,
        "methodology": run_output.methodology,
        "assumptions": run_output.assumptions,
        "warnings": run_output.warnings,
        "metadata": serde_json::to_value(&run_output.metadata)?,
    }))
}
