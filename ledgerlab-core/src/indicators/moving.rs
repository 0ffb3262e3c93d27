//! Moving averages.
//!
//! SMA: rolling mean over a full window, NaN until `window` values are seen.
//! EMA: `EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]` with
//! `alpha = 2 / (span + 1)`, seeded with the first value (no SMA warmup).

/// Simple moving average over `window` values.
///
/// A window containing a NaN produces NaN.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= window {
            let leaving = values[i - window];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= window && nan_count == 0 {
            result[i] = sum / window as f64;
        }
    }
    result
}

/// Exponential moving average with span `span`, seeded with the first
/// non-missing value.
///
/// A missing input yields NaN at that position and leaves the recursion
/// where it was.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if span == 0 {
        return result;
    }
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut prev: Option<f64> = None;
    for (out, &v) in result.iter_mut().zip(values) {
        if v.is_nan() {
            continue;
        }
        let next = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        *out = next;
        prev = Some(next);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let result = sma(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5);
        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().take(4).enumerate() {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_taints_window() {
        let result = sma(&[10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0], 3);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_short_or_zero_window() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_seeded_with_first_value() {
        // span 3 → alpha 0.5
        let result = ema(&[10.0, 20.0, 20.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 15.0, DEFAULT_EPSILON);
        assert_approx(result[2], 17.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_skips_missing_input() {
        let result = ema(&[f64::NAN, 10.0, f64::NAN, 20.0], 3);
        assert!(result[0].is_nan());
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        assert_approx(result[3], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_of_constant_is_constant() {
        let result = ema(&[42.0; 30], 12);
        assert!(result.iter().all(|&v| (v - 42.0).abs() < DEFAULT_EPSILON));
    }
}
