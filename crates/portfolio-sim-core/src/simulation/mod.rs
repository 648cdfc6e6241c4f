pub mod config;
pub mod generator;
pub mod paths;
pub mod time_index;

pub use config::{ModelVariant, SimulationConfig, SimulationInput, TextFields};
pub use generator::{generate_paths, simulate, PathGenerator, PathModel, SimulationRun};
pub use paths::{thinned_columns, PathMatrix, TimeSlice};
pub use time_index::{TimeIndexMapper, TimeLabel};
