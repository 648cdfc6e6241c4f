pub mod error;
pub mod simulation;
pub mod statistics;
pub mod types;

pub use error::SimulationError;
pub use types::*;

/// Standard result type for all portfolio-sim operations
pub type SimulationResult<T> = Result<T, SimulationError>;
