mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::simulate::{PathsArgs, SummaryArgs};

/// Monte Carlo simulation of a portfolio with periodic contributions
#[derive(Parser)]
#[command(
    name = "pfsim",
    version,
    about = "Monte Carlo simulation of a portfolio with periodic contributions",
    long_about = "Simulates portfolio value paths under geometric Brownian motion with \
                  lump-sum periodic contributions, and reports the distribution of \
                  outcomes (mean, 5th/95th percentiles, smoothed density, invested \
                  capital) at any point in time."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise the distribution of portfolio values at one or more times
    Summary(SummaryArgs),
    /// Dump the simulated trajectories and the invested-capital curve
    Paths(PathsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summary(args) => commands::simulate::run_summary(args),
        Commands::Paths(args) => commands::simulate::run_paths(args),
        Commands::Version => {
            println!("pfsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
