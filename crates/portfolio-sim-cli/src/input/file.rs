use std::fs;
use std::path::PathBuf;

use portfolio_sim_core::simulation::SimulationInput;

/// Load a simulation input document. Fields missing from the file keep
/// their defaults.
pub fn read_input(path: &str) -> Result<SimulationInput, Box<dyn std::error::Error>> {
    let location = locate(path)?;
    let text = fs::read_to_string(&location)
        .map_err(|e| format!("cannot read {}: {e}", location.display()))?;
    parse_input(&text).map_err(|e| format!("{}: {e}", location.display()).into())
}

/// Parse a JSON simulation input, shared by file and stdin readers.
pub fn parse_input(text: &str) -> Result<SimulationInput, serde_json::Error> {
    serde_json::from_str(text)
}

fn locate(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let location = std::env::current_dir()?.join(path);
    match fs::metadata(&location) {
        Ok(meta) if meta.is_file() => Ok(location),
        Ok(_) => Err(format!("{} is not a regular file", location.display()).into()),
        Err(_) => Err(format!("input file {} does not exist", location.display()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let input = parse_input(r#"{ "contribution_amount": 250.0, "seed": 9 }"#).unwrap();
        assert_eq!(input.contribution_amount, 250.0);
        assert_eq!(input.seed, Some(9));
        assert_eq!(input.num_simulations, SimulationInput::default().num_simulations);
    }

    #[test]
    fn test_missing_file_reported() {
        let err = read_input("no-such-input.json").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
