//! Relative Strength Index on percentage changes.
//!
//! Simple averaging, not Wilder smoothing: gains and losses are the positive
//! and negative parts of `pct_change`, each averaged over a rolling `window`.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 with gains → 100; no movement at all → NaN.

use super::moving::sma;
use super::returns::pct_change;

pub fn rsi(values: &[f64], window: usize) -> Vec<f64> {
    let changes = pct_change(values);
    let gains: Vec<f64> = changes
        .iter()
        .map(|&c| if c.is_nan() { c } else { c.max(0.0) })
        .collect();
    let losses: Vec<f64> = changes
        .iter()
        .map(|&c| if c.is_nan() { c } else { (-c).max(0.0) })
        .collect();

    sma(&gains, window)
        .into_iter()
        .zip(sma(&losses, window))
        .map(|(gain, loss)| 100.0 - 100.0 / (1.0 + gain / loss))
        .collect()
}
