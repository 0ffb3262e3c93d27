//! Signal sources: strategies that turn prices into raw signal panels.
//!
//! A signal source is a pure function of the aligned price panel. It never
//! sees cash, holdings or fills, and it runs exactly once per backtest, before
//! the engine starts. Its output may be on any index with any scores; the
//! normalizer takes care of reindexing, clamping and the one-day lag.

pub mod benchmark;
pub mod crossover;
pub mod threshold;

pub use benchmark::{BuyOnce, NullSignal};
pub use crossover::{MaCrossover, Macd};
pub use threshold::{RsiThreshold, VolatilityBreakout};

use serde::{Deserialize, Serialize};

use crate::error::BacktestError;
use crate::panel::{Panel, PricePanel, RawSignalPanel};

/// Trait for signal sources.
///
/// # Architecture invariant
/// `compute_signals` receives the price panel and nothing else. A strategy
/// that needs portfolio state does not belong behind this trait.
pub trait SignalSource: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Scores for every date and instrument the strategy cares about.
    ///
    /// A value at row `t` must only use prices up to and including `t`.
    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel;
}

/// Serializable strategy selection, as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    MaCrossover(MaCrossover),
    Macd(Macd),
    RsiThreshold(RsiThreshold),
    VolatilityBreakout(VolatilityBreakout),
    BuyOnce(BuyOnce),
    NullSignal,
}

impl StrategySpec {
    /// Check parameters, then box the strategy.
    pub fn build(&self) -> Result<Box<dyn SignalSource>, BacktestError> {
        self.validate()?;
        Ok(match self {
            StrategySpec::MaCrossover(s) => Box::new(s.clone()),
            StrategySpec::Macd(s) => Box::new(s.clone()),
            StrategySpec::RsiThreshold(s) => Box::new(s.clone()),
            StrategySpec::VolatilityBreakout(s) => Box::new(s.clone()),
            StrategySpec::BuyOnce(s) => Box::new(s.clone()),
            StrategySpec::NullSignal => Box::new(NullSignal),
        })
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        let invalid = |msg: String| Err(BacktestError::InvalidConfig(msg));
        match self {
            StrategySpec::MaCrossover(s) if s.fast == 0 || s.slow <= s.fast => invalid(format!(
                "ma_crossover needs 0 < fast < slow, got fast={} slow={}",
                s.fast, s.slow
            )),
            StrategySpec::Macd(s) if s.fast == 0 || s.slow <= s.fast || s.signal == 0 => {
                invalid(format!(
                    "macd needs 0 < fast < slow and signal > 0, got {}/{}/{}",
                    s.fast, s.slow, s.signal
                ))
            }
            StrategySpec::RsiThreshold(s)
                if s.window == 0
                    || !(0.0..=100.0).contains(&s.oversold)
                    || !(0.0..=100.0).contains(&s.overbought)
                    || s.oversold > s.overbought =>
            {
                invalid(format!(
                    "rsi_threshold needs window > 0 and 0 <= oversold <= overbought <= 100, \
                     got window={} oversold={} overbought={}",
                    s.window, s.oversold, s.overbought
                ))
            }
            StrategySpec::VolatilityBreakout(s) if s.window < 2 => invalid(format!(
                "volatility_breakout needs window >= 2, got {}",
                s.window
            )),
            _ => Ok(()),
        }
    }

    /// Name of the strategy this spec builds.
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::MaCrossover(_) => "ma_crossover",
            StrategySpec::Macd(_) => "macd",
            StrategySpec::RsiThreshold(_) => "rsi_threshold",
            StrategySpec::VolatilityBreakout(_) => "volatility_breakout",
            StrategySpec::BuyOnce(_) => "buy_once",
            StrategySpec::NullSignal => "null_signal",
        }
    }
}

/// Apply a per-series rule to every instrument column.
pub(crate) fn per_instrument(
    prices: &PricePanel,
    rule: impl Fn(&[f64]) -> Vec<f64>,
) -> RawSignalPanel {
    let mut out: RawSignalPanel = Panel::like(prices.panel(), 0.0);
    for i in 0..prices.n_symbols() {
        out.set_column(i, &rule(&prices.column(i)));
    }
    out
}

#[cfg(test)]
pub(crate) fn make_prices(columns: Vec<(&str, Vec<f64>)>) -> PricePanel {
    let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    PricePanel::from_columns(
        crate::panel::daily_dates(start, n),
        columns
            .into_iter()
            .map(|(s, c)| (s.to_string(), c))
            .collect(),
    )
    .unwrap()
}
