//! Crossover strategies: moving-average golden/death cross and MACD.

use serde::{Deserialize, Serialize};

use super::{per_instrument, SignalSource};
use crate::indicators::{ema, sma};
use crate::panel::{PricePanel, RawSignalPanel};

/// Fast/slow simple moving average crossover.
///
/// +1 on the day the fast SMA closes above the slow one after not being above
/// it (a missing yesterday counts as "not above"), -1 on the opposite cross.
/// Nothing fires until both averages exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossover {
    pub fast: usize,
    pub slow: usize,
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self { fast: 20, slow: 50 }
    }
}

impl SignalSource for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        per_instrument(prices, |closes| {
            ma_cross(&sma(closes, self.fast), &sma(closes, self.slow))
        })
    }
}

fn ma_cross(fast: &[f64], slow: &[f64]) -> Vec<f64> {
    let mut above_yesterday = false;
    fast.iter()
        .zip(slow)
        .map(|(&f, &s)| {
            // NaN compares false, so an undefined day is never "above".
            let above = f > s;
            let signal = if f.is_nan() || s.is_nan() {
                0.0
            } else if above && !above_yesterday {
                1.0
            } else if !above && above_yesterday {
                -1.0
            } else {
                0.0
            };
            above_yesterday = above;
            signal
        })
        .collect()
}

/// MACD line vs. its signal line.
///
/// MACD = EMA(fast) - EMA(slow); signal line = EMA(signal) of MACD. +1 when
/// MACD moves above the signal line (yesterday at or below), -1 when it moves
/// below (yesterday at or above). Needs a defined yesterday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl SignalSource for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        per_instrument(prices, |closes| {
            let macd: Vec<f64> = ema(closes, self.fast)
                .into_iter()
                .zip(ema(closes, self.slow))
                .map(|(f, s)| f - s)
                .collect();
            let line = ema(&macd, self.signal);

            let mut out = vec![0.0; closes.len()];
            for t in 1..closes.len() {
                let (m, s) = (macd[t], line[t]);
                let (pm, ps) = (macd[t - 1], line[t - 1]);
                if m > s && pm <= ps {
                    out[t] = 1.0;
                } else if m < s && pm >= ps {
                    out[t] = -1.0;
                }
            }
            out
        })
    }
}
