// ============================================================================
// Descriptive statistics over plain slices
// ============================================================================

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sum of squared deviations from the mean
pub fn sum_sq_dev(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|&x| (x - m) * (x - m)).sum()
}

/// Sample standard deviation (divides by n - 1). Zero for fewer than two values.
pub fn std_dev(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    (sum_sq_dev(data) / (n - 1) as f64).sqrt()
}

pub fn find_min_max(data: &[f64]) -> (f64, f64) {
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;

    for &val in data {
        if val < min_val {
            min_val = val;
        }
        if val > max_val {
            max_val = val;
        }
    }

    (min_val, max_val)
}

// ============================================================================
// Paired error measures
// ============================================================================

/// Mean of squared differences between two equal-length series
pub fn mean_squared_diff(a: &[f64], b: &[f64]) -> f64 {
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).collect();
    mean(&diffs)
}

/// Mean of absolute differences between two equal-length series
pub fn mean_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| (x - y).abs()).collect();
    mean(&diffs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_spread() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        assert!((mean(&x) - 2.5).abs() < 1e-12);
        assert!((sum_sq_dev(&x) - 5.0).abs() < 1e-12);
        assert!((std_dev(&x) - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(mean(&[]).is_nan());
        assert_eq!(std_dev(&[7.0]), 0.0);
    }

    #[test]
    fn test_find_min_max() {
        let (lo, hi) = find_min_max(&[3.0, -1.5, 8.25, 0.0]);
        assert_eq!(lo, -1.5);
        assert_eq!(hi, 8.25);
    }

    #[test]
    fn test_paired_errors() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.5, 2.0, 2.0];
        assert!((mean_squared_diff(&a, &b) - (0.25 + 0.0 + 1.0) / 3.0).abs() < 1e-12);
        assert!((mean_abs_diff(&a, &b) - 0.5).abs() < 1e-12);
    }
}
