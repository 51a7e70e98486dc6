//! Population statistics over non-empty slices.

/// Arithmetic mean. Callers guarantee a non-empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance (divides by n)
pub fn population_variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64
}

pub fn population_std(xs: &[f64]) -> f64 {
    population_variance(xs).sqrt()
}

/// Percentile `p` in 0–100, linear interpolation between order statistics.
pub fn percentile(xs: &[f64], p: f64) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Consecutive differences; empty for fewer than two elements
pub fn diff(xs: &[f64]) -> Vec<f64> {
    xs.windows(2).map(|w| w[1] - w[0]).collect()
}

pub(crate) fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_estimators() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&xs), 5.0);
        assert_eq!(population_variance(&xs), 4.0);
        assert_eq!(population_std(&xs), 2.0);
    }

    #[test]
    fn percentile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        // rank 0.75 * 3 = 2.25 -> 3 + 0.25
        assert!((percentile(&xs, 75.0) - 3.25).abs() < 1e-12);
        // rank 0.9 * 3 = 2.7 -> 3 + 0.7
        assert!((percentile(&xs, 90.0) - 3.7).abs() < 1e-12);
        assert_eq!(percentile(&xs, 0.0), 1.0);
        assert_eq!(percentile(&xs, 100.0), 4.0);
    }

    #[test]
    fn percentile_ignores_input_order() {
        assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), 2.5);
    }

    #[test]
    fn single_element() {
        assert_eq!(population_std(&[42.0]), 0.0);
        assert_eq!(percentile(&[42.0], 75.0), 42.0);
        assert_eq!(percentile(&[42.0], 90.0), 42.0);
    }

    #[test]
    fn diff_short_inputs() {
        assert!(diff(&[]).is_empty());
        assert!(diff(&[1.0]).is_empty());
        assert_eq!(diff(&[1.0, 4.0, 4.0, 10.0]), vec![3.0, 0.0, 6.0]);
    }
}
