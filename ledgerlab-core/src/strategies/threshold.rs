//! Level-triggered strategies: RSI bands and volatility breakout.

use serde::{Deserialize, Serialize};

use super::{per_instrument, SignalSource};
use crate::indicators::{pct_change, rolling_std, rsi};
use crate::panel::{PricePanel, RawSignalPanel};

/// Buy while RSI is below `oversold`, sell while it is above `overbought`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiThreshold {
    pub window: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self {
            window: 10,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl SignalSource for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        per_instrument(prices, |closes| {
            rsi(closes, self.window)
                .into_iter()
                .map(|r| {
                    if r < self.oversold {
                        1.0
                    } else if r > self.overbought {
                        -1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
    }
}

/// Buy when the daily return exceeds the rolling standard deviation of the
/// price level, sell when it falls below its negative.
///
/// The threshold is in price units while the return is a fraction, so the
/// rule fires mostly on low-priced series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityBreakout {
    pub window: usize,
}

impl Default for VolatilityBreakout {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl SignalSource for VolatilityBreakout {
    fn name(&self) -> &str {
        "volatility_breakout"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        per_instrument(prices, |closes| {
            pct_change(closes)
                .into_iter()
                .zip(rolling_std(closes, self.window))
                .map(|(ret, std)| {
                    if ret > std {
                        1.0
                    } else if ret < -std {
                        -1.0
                    } else {
                        0.0
                    }
                })
                .collect()
        })
    }
}
