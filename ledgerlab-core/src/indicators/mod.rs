//! Series indicators used by the reference strategies.
//!
//! Indicators are pure functions: one price column in, one series of the same
//! length out. Warmup positions are `f64::NAN`, and a missing input taints
//! every output whose window contains it. No value at `t` depends on data
//! after `t`.

pub mod moving;
pub mod returns;
pub mod rsi;

pub use moving::{ema, sma};
pub use returns::{pct_change, rolling_std};
pub use rsi::rsi;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    /// Truncating the input never changes earlier outputs.
    #[test]
    fn no_lookahead_in_any_indicator() {
        let full: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let cut = &full[..40];

        let pairs: Vec<(Vec<f64>, Vec<f64>)> = vec![
            (sma(&full, 10), sma(cut, 10)),
            (ema(&full, 12), ema(cut, 12)),
            (rolling_std(&full, 20), rolling_std(cut, 20)),
            (pct_change(&full), pct_change(cut)),
            (rsi(&full, 10), rsi(cut, 10)),
        ];
        for (long, short) in pairs {
            for (t, (&a, &b)) in long.iter().zip(&short).enumerate() {
                assert!(
                    (a.is_nan() && b.is_nan()) || a == b,
                    "value at {t} changed after truncation: {a} vs {b}"
                );
            }
        }
    }
}
