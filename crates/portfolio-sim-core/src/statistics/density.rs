#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::consts::SQRT_2PI;

use super::percentile::{mean, sample_std_dev};

/// Resolution of every density curve.
pub const DENSITY_GRID_POINTS: usize = 500;

/// Spread at or below this fraction of `max(1, |mean|)` counts as zero.
const DEGENERATE_SPREAD: f64 = 1e-12;

/// Half-width of the synthetic spike, relative to `max(1, |value|)`.
const SPIKE_HALF_WIDTH: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DensityMethod {
    /// Gaussian kernel with Scott's rule bandwidth.
    GaussianKde { bandwidth: f64 },
    /// Fewer than two values, or all values equal: a narrow Gaussian spike
    /// centred on the common value.
    DegenerateSpike { half_width: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub value: f64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityEstimate {
    pub method: DensityMethod,
    pub points: Vec<DensityPoint>,
}

impl DensityEstimate {
    pub fn is_degenerate(&self) -> bool {
        matches!(self.method, DensityMethod::DegenerateSpike { .. })
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            let mut xs: Vec<f64> = (0..n).map(|i| lo + i as f64 * step).collect();
            xs[n - 1] = hi;
            xs
        }
    }
}

fn kernel_density(x: f64, samples: &[f64], bandwidth: f64) -> f64 {
    let sum: f64 = samples
        .iter()
        .map(|xi| {
            let z = (x - xi) / bandwidth;
            (-0.5 * z * z).exp()
        })
        .sum();
    sum / (samples.len() as f64 * bandwidth * SQRT_2PI)
}

fn evaluate(grid: Vec<f64>, samples: &[f64], bandwidth: f64) -> Vec<DensityPoint> {
    let point = |value: f64| DensityPoint {
        value,
        density: kernel_density(value, samples, bandwidth),
    };

    #[cfg(feature = "parallel")]
    {
        grid.into_par_iter().map(point).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        grid.into_iter().map(point).collect()
    }
}

/// Gaussian kernel density estimate on `grid_points` equally spaced values
/// spanning `[min, max]` of `values`.
///
/// `values` must be non-empty and finite. Degenerate input (a single value or
/// zero spread) never fails: it yields a spike of half-width
/// `1e-6 * max(1, |v|)` around the common value `v`.
pub fn gaussian_kde(values: &[f64], grid_points: usize) -> DensityEstimate {
    debug_assert!(!values.is_empty());
    let m = mean(values);
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if values.len() < 2 || hi - lo <= DEGENERATE_SPREAD * m.abs().max(1.0) {
        let half_width = SPIKE_HALF_WIDTH * m.abs().max(1.0);
        let grid = linspace(m - half_width, m + half_width, grid_points);
        return DensityEstimate {
            method: DensityMethod::DegenerateSpike { half_width },
            points: evaluate(grid, &[m], half_width / 4.0),
        };
    }

    // Scott's rule
    let bandwidth = sample_std_dev(values) * (values.len() as f64).powf(-0.2);
    DensityEstimate {
        method: DensityMethod::GaussianKde { bandwidth },
        points: evaluate(linspace(lo, hi, grid_points), values, bandwidth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trapezoid(points: &[DensityPoint]) -> f64 {
        points
            .windows(2)
            .map(|w| 0.5 * (w[0].density + w[1].density) * (w[1].value - w[0].value))
            .sum()
    }

    #[test]
    fn test_grid_spans_min_to_max() {
        let values = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6];
        let est = gaussian_kde(&values, DENSITY_GRID_POINTS);
        assert_eq!(est.points.len(), 500);
        assert_eq!(est.points[0].value, 1.0);
        assert_eq!(est.points[499].value, 9.0);
        assert!(!est.is_degenerate());
    }

    #[test]
    fn test_scott_bandwidth() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let est = gaussian_kde(&values, 50);
        let expected = sample_std_dev(&values) * 5.0_f64.powf(-0.2);
        match est.method {
            DensityMethod::GaussianKde { bandwidth } => {
                assert!((bandwidth - expected).abs() < 1e-12)
            }
            other => panic!("unexpected method {other:?}"),
        }
    }

    #[test]
    fn test_density_non_negative_and_peaks_near_cluster() {
        let values = [10.0, 10.1, 9.9, 10.05, 9.95, 20.0];
        let est = gaussian_kde(&values, 200);
        assert!(est.points.iter().all(|p| p.density >= 0.0 && p.density.is_finite()));
        let peak = est
            .points
            .iter()
            .max_by(|a, b| a.density.partial_cmp(&b.density).unwrap())
            .unwrap();
        assert!((peak.value - 10.0).abs() < 1.0, "peak at {}", peak.value);
    }

    #[test]
    fn test_single_value_spike() {
        let est = gaussian_kde(&[1000.0], DENSITY_GRID_POINTS);
        assert!(est.is_degenerate());
        assert_eq!(est.points.len(), 500);
        assert!(est.points.iter().all(|p| p.density.is_finite()));
        let area = trapezoid(&est.points);
        assert!((area - 1.0).abs() < 1e-3, "area={area}");
    }

    #[test]
    fn test_identical_values_spike() {
        let est = gaussian_kde(&[28_000.0; 500], DENSITY_GRID_POINTS);
        match est.method {
            DensityMethod::DegenerateSpike { half_width } => {
                assert!((half_width - 0.028).abs() < 1e-12)
            }
            other => panic!("unexpected method {other:?}"),
        }
        assert!(est.points[0].value < 28_000.0);
        assert!(est.points[499].value > 28_000.0);
    }

    #[test]
    fn test_zero_valued_spike_uses_unit_scale() {
        let est = gaussian_kde(&[0.0, 0.0], 10);
        assert_eq!(
            est.method,
            DensityMethod::DegenerateSpike { half_width: 1e-6 }
        );
    }
}
