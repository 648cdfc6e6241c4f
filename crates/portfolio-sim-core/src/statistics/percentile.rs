/// Finite values in ascending order, the basis for order statistics.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortedSample {
    values: Vec<f64>,
}

impl SortedSample {
    /// Keep the finite values and sort them. Also returns how many were
    /// dropped.
    pub(crate) fn from_finite(values: Vec<f64>) -> (Self, usize) {
        let total = values.len();
        let mut values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        values.sort_by(f64::total_cmp);
        let dropped = total - values.len();
        (SortedSample { values }, dropped)
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    /// Quantile `q` in `[0, 1]` with linear interpolation between the two
    /// order statistics around rank `q * (n - 1)`, the same rule numpy uses
    /// by default. `None` when the sample is empty.
    pub(crate) fn quantile(&self, q: f64) -> Option<f64> {
        let last = self.values.len().checked_sub(1)?;
        let rank = q.clamp(0.0, 1.0) * last as f64;
        let below = rank.floor() as usize;
        let weight = rank - below as f64;
        let low = self.values[below];
        match self.values.get(below + 1) {
            Some(&high) if weight > 0.0 => Some(low + (high - low) * weight),
            _ => Some(low),
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    (ss / (values.len() - 1) as f64).sqrt()
}
