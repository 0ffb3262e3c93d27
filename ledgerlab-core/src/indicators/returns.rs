//! Return and dispersion series.

/// One-period percentage change: `x[t] / x[t-1] - 1`. NaN at `t = 0` or when
/// either side is missing.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for (i, w) in values.windows(2).enumerate() {
        let (prev, curr) = (w[0], w[1]);
        if !prev.is_nan() && !curr.is_nan() {
            result[i + 1] = curr / prev - 1.0;
        }
    }
    result
}

/// Rolling sample standard deviation (n - 1 denominator) over a full window.
///
/// A window of one has no sample deviation and yields NaN, as does a window
/// containing a missing value.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 || n < window {
        return result;
    }

    for end in window..=n {
        let slice = &values[end - window..end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|v| (v - mean).powi(2)).sum();
        result[end - 1] = (ss / (window - 1) as f64).sqrt();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_change_basic() {
        let result = pct_change(&[100.0, 110.0, 99.0]);
        assert!(result[0].is_nan());
        assert_approx(result[1], 0.10, DEFAULT_EPSILON);
        assert_approx(result[2], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_missing_side() {
        let result = pct_change(&[100.0, f64::NAN, 100.0]);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
    }

    #[test]
    fn rolling_std_sample_denominator() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: sample variance 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert!(result[..7].iter().all(|v| v.is_nan()));
        assert_approx(result[7], (32.0f64 / 7.0).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_constant_is_zero() {
        let result = rolling_std(&[3.0; 5], 3);
        assert_approx(result[2], 0.0, DEFAULT_EPSILON);
        assert_approx(result[4], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_degenerate_window() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 1).iter().all(|v| v.is_nan()));
    }
}
