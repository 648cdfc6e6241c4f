use serde::{Deserialize, Serialize};

use crate::types::Years;

/// Row-major table of simulated portfolio values, one row per path and one
/// column per grid time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMatrix {
    num_paths: usize,
    num_steps: usize,
    values: Vec<f64>,
}

/// The cross-section of every path at a single grid column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlice {
    pub index: usize,
    pub time_years: Years,
    pub values: Vec<f64>,
}

/// Column indices kept when thinning a grid of `num_steps` columns to every
/// `every`-th one. The last column is always included.
pub fn thinned_columns(num_steps: usize, every: usize) -> Vec<usize> {
    let mut columns: Vec<usize> = (0..num_steps).step_by(every.max(1)).collect();
    if let Some(&last) = columns.last() {
        if last + 1 != num_steps {
            columns.push(num_steps - 1);
        }
    }
    columns
}

impl PathMatrix {
    /// Assemble a matrix from equally long rows.
    ///
    /// Rows are produced by the path generator, which always fills the full
    /// grid, so a length mismatch is a programming error.
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>, num_steps: usize) -> Self {
        let num_paths = rows.len();
        let mut values = Vec::with_capacity(num_paths * num_steps);
        for row in rows {
            debug_assert_eq!(row.len(), num_steps);
            values.extend(row);
        }
        PathMatrix {
            num_paths,
            num_steps,
            values,
        }
    }

    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// One simulated path. Panics if `path >= num_paths()`.
    pub fn row(&self, path: usize) -> &[f64] {
        let start = path * self.num_steps;
        &self.values[start..start + self.num_steps]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.num_steps.max(1))
    }

    /// Copy out column `index`, or `None` when it lies outside the grid.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.num_steps {
            return None;
        }
        Some(self.rows().map(|row| row[index]).collect())
    }

    /// Build the cross-sectional view at `index`, stamped with its grid time.
    pub fn slice(&self, index: usize, dt: Years) -> Option<TimeSlice> {
        self.column(index).map(|values| TimeSlice {
            index,
            time_years: index as f64 * dt,
            values,
        })
    }

    /// Number of paths holding at least one `inf` or `NaN`.
    pub fn non_finite_paths(&self) -> usize {
        self.rows()
            .filter(|row| row.iter().any(|v| !v.is_finite()))
            .count()
    }

    /// Keep every `every`-th column, always including the last one.
    pub fn thinned(&self, every: usize) -> PathMatrix {
        let columns = thinned_columns(self.num_steps, every);
        let rows = self
            .rows()
            .map(|row| columns.iter().map(|&c| row[c]).collect())
            .collect();
        PathMatrix::from_rows(rows, columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PathMatrix {
        PathMatrix::from_rows(
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            3,
        )
    }

    #[test]
    fn test_row_and_column_access() {
        let m = small();
        assert_eq!(m.num_paths(), 2);
        assert_eq!(m.num_steps(), 3);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(1), Some(vec![2.0, 5.0]));
        assert_eq!(m.column(3), None);
    }

    #[test]
    fn test_slice_carries_time() {
        let s = small().slice(2, 0.5).unwrap();
        assert_eq!(s.index, 2);
        assert_eq!(s.time_years, 1.0);
        assert_eq!(s.values, vec![3.0, 6.0]);
    }

    #[test]
    fn test_non_finite_paths_counted_per_row() {
        let m = PathMatrix::from_rows(
            vec![
                vec![1.0, f64::INFINITY, f64::NAN],
                vec![1.0, 2.0, 3.0],
            ],
            3,
        );
        assert_eq!(m.non_finite_paths(), 1);
    }

    #[test]
    fn test_thinned_keeps_last_column() {
        let m = PathMatrix::from_rows(vec![(0..10).map(f64::from).collect()], 10);
        let t = m.thinned(4);
        assert_eq!(t.row(0), &[0.0, 4.0, 8.0, 9.0]);
        assert_eq!(m.thinned(1), m);
        assert_eq!(thinned_columns(10, 0), (0..10).collect::<Vec<_>>());
        assert_eq!(thinned_columns(10, 3), vec![0, 3, 6, 9]);
    }
}
