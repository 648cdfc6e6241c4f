use std::io::{self, Read};

use portfolio_sim_core::simulation::SimulationInput;

use super::file::parse_input;

/// Simulation input piped on stdin, if any. An interactive terminal or a
/// blank stream yields `None` so the caller can fall back to defaults.
pub fn read_input() -> Result<Option<SimulationInput>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut piped = String::new();
    io::stdin().read_to_string(&mut piped)?;
    if piped.trim().is_empty() {
        return Ok(None);
    }

    parse_input(&piped)
        .map(Some)
        .map_err(|e| format!("stdin: {e}").into())
}
