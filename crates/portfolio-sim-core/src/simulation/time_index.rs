use serde::{Deserialize, Serialize};

use super::config::SimulationConfig;
use crate::types::Years;

/// Whole years and remaining months of a grid time, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLabel {
    pub years: u64,
    pub months: u64,
}

/// Maps continuous time coordinates onto grid columns of a path matrix.
#[derive(Debug, Clone, Copy)]
pub struct TimeIndexMapper {
    horizon: Years,
    num_steps: usize,
}

impl TimeIndexMapper {
    pub fn new(config: &SimulationConfig) -> Self {
        TimeIndexMapper {
            horizon: config.horizon(),
            num_steps: config.num_steps(),
        }
    }

    fn dt(&self) -> Years {
        self.horizon / self.num_steps as f64
    }

    /// `round(time / T * N)` clamped to `[0, N - 1]`. Out-of-range and NaN
    /// inputs are clamped rather than rejected; NaN maps to column 0.
    pub fn index_for_time(&self, time: Years) -> usize {
        let raw = (time / self.horizon * self.num_steps as f64).round();
        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        let last = self.num_steps - 1;
        if raw >= last as f64 {
            last
        } else {
            raw as usize
        }
    }

    /// Grid time of column `index`.
    pub fn time_at_index(&self, index: usize) -> Years {
        index as f64 * self.dt()
    }

    /// Whole years and months of column `index`. Saturates at `u64::MAX`
    /// months, far beyond any horizon a float grid can resolve by month.
    pub fn label_for_index(&self, index: usize) -> TimeLabel {
        // Nudge so that 29.999.. months still reads as 30.
        let total_months = (self.time_at_index(index) * 12.0 + 1e-9).floor() as u64;
        TimeLabel {
            years: total_months / 12,
            months: total_months % 12,
        }
    }

    /// Every grid time, one per matrix column.
    pub fn grid(&self) -> Vec<Years> {
        (0..self.num_steps).map(|k| self.time_at_index(k)).collect()
    }

    pub fn last_index(&self) -> usize {
        self.num_steps - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> TimeIndexMapper {
        let config =
            SimulationConfig::new(10.0, 2520, 0.08, 0.1, 1000.0, 1.0 / 12.0, 100.0, 2, Some(1))
                .unwrap();
        TimeIndexMapper::new(&config)
    }

    #[test]
    fn test_maps_and_rounds() {
        let m = mapper();
        assert_eq!(m.index_for_time(0.0), 0);
        assert_eq!(m.index_for_time(5.0), 1260);
        let dt = 10.0 / 2520.0;
        assert_eq!(m.index_for_time(dt * 2.4), 2);
        assert_eq!(m.index_for_time(dt * 2.6), 3);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let m = mapper();
        assert_eq!(m.index_for_time(-3.0), 0);
        assert_eq!(m.index_for_time(10.0), 2519);
        assert_eq!(m.index_for_time(1e9), 2519);
        assert_eq!(m.index_for_time(f64::NAN), 0);
        assert_eq!(m.index_for_time(f64::INFINITY), 2519);
    }

    #[test]
    fn test_label_years_and_months() {
        let m = mapper();
        assert_eq!(m.label_for_index(0), TimeLabel { years: 0, months: 0 });
        // 2.5 years = column 630
        assert_eq!(m.label_for_index(630), TimeLabel { years: 2, months: 6 });
    }

    #[test]
    fn test_label_beyond_u32_months() {
        let config = SimulationConfig::new(1e9, 2, 0.0, 0.0, 1.0, 1e9, 0.0, 1, None).unwrap();
        let m = TimeIndexMapper::new(&config);
        // 5e8 years is 6e9 months, past u32::MAX.
        assert_eq!(
            m.label_for_index(1),
            TimeLabel {
                years: 500_000_000,
                months: 0
            }
        );
    }

    #[test]
    fn test_grid_matches_columns() {
        let m = mapper();
        let grid = m.grid();
        assert_eq!(grid.len(), 2520);
        assert_eq!(grid[0], 0.0);
        assert!((grid[2519] - (10.0 - 10.0 / 2520.0)).abs() < 1e-12);
    }

    #[test]
    fn test_single_step_grid() {
        let config = SimulationConfig::new(1.0, 1, 0.0, 0.0, 1.0, 1.0, 0.0, 1, None).unwrap();
        let m = TimeIndexMapper::new(&config);
        assert_eq!(m.index_for_time(0.7), 0);
        assert_eq!(m.last_index(), 0);
    }
}
