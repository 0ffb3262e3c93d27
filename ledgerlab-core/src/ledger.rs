//! Ledger: the read-only record of a completed run.
//!
//! Assembly is pure aggregation: no decisions, only shape checks and the
//! mark-to-market total. The accounting identity holds on every date:
//! `total_assets == cash + Σ holdings × price` (missing price → 0).

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Fill, LedgerHash, Symbol};
use crate::engine::{position_value, ExecutionConfig};
use crate::error::BacktestError;
use crate::panel::{Panel, PricePanel, SignalPanel};

/// Complete output of one backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    strategy: String,
    config: ExecutionConfig,
    prices: PricePanel,
    raw_signals: SignalPanel,
    executed_signals: SignalPanel,
    trades: Panel<i64>,
    holdings: Panel<i64>,
    cash: Vec<f64>,
    total_assets: Vec<f64>,
    fills: Vec<Fill>,
}

/// Assemble a ledger from engine output.
///
/// Fails with `ShapeMismatch` if any panel is not on the price panel's index
/// or the cash series length differs from the number of dates.
pub fn assemble(
    prices: &PricePanel,
    raw_signals: &SignalPanel,
    executed_signals: &SignalPanel,
    trades: Panel<i64>,
    holdings: Panel<i64>,
    cash: Vec<f64>,
) -> Result<Ledger, BacktestError> {
    let index = prices.panel();
    for (name, ok) in [
        ("raw signals", raw_signals.same_index(index)),
        ("executed signals", executed_signals.same_index(index)),
        ("trades", trades.same_index(index)),
        ("holdings", holdings.same_index(index)),
    ] {
        if !ok {
            return Err(BacktestError::ShapeMismatch(format!(
                "{name} panel is not on the price panel's index"
            )));
        }
    }
    if cash.len() != prices.n_dates() {
        return Err(BacktestError::ShapeMismatch(format!(
            "cash series has {} entries for {} dates",
            cash.len(),
            prices.n_dates()
        )));
    }

    let total_assets = (0..prices.n_dates())
        .map(|t| cash[t] + position_value(holdings.row(t), prices.row(t)))
        .collect();

    Ok(Ledger {
        strategy: String::new(),
        config: ExecutionConfig::default(),
        prices: prices.clone(),
        raw_signals: raw_signals.clone(),
        executed_signals: executed_signals.clone(),
        trades,
        holdings,
        cash,
        total_assets,
        fills: Vec::new(),
    })
}

/// Everything the ledger knows about one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerRow<'a> {
    pub date: NaiveDate,
    pub symbols: &'a [Symbol],
    pub prices: &'a [f64],
    pub raw_signals: &'a [i8],
    pub executed_signals: &'a [i8],
    pub trades: &'a [i64],
    pub holdings: &'a [i64],
    pub cash: f64,
    pub total_assets: f64,
}

/// One instrument's full history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentTrail {
    pub symbol: Symbol,
    pub prices: Vec<f64>,
    pub raw_signals: Vec<i8>,
    pub executed_signals: Vec<i8>,
    pub trades: Vec<i64>,
    pub holdings: Vec<i64>,
}

/// A broken ledger invariant. Seeing one means a bug, not a market condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("negative holdings {holdings} of '{symbol}' on {date}")]
    NegativeHoldings {
        date: NaiveDate,
        symbol: Symbol,
        holdings: i64,
    },

    #[error("negative cash {cash} on {date}")]
    NegativeCash { date: NaiveDate, cash: f64 },

    #[error("holdings of '{symbol}' on {date} do not equal previous holdings plus trade")]
    Discontinuity { date: NaiveDate, symbol: Symbol },

    #[error("total assets {actual} on {date} differ from cash + positions {expected}")]
    Conservation {
        date: NaiveDate,
        expected: f64,
        actual: f64,
    },

    #[error("executed signal on the first date is {signal} for '{symbol}' under a lagged policy")]
    LookAhead { symbol: Symbol, signal: i8 },
}

impl Ledger {
    pub(crate) fn with_fills(mut self, fills: Vec<Fill>) -> Self {
        self.fills = fills;
        self
    }

    pub(crate) fn with_run_info(mut self, strategy: &str, config: ExecutionConfig) -> Self {
        self.strategy = strategy.to_string();
        self.config = config;
        self
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.prices.dates()
    }

    pub fn symbols(&self) -> &[Symbol] {
        self.prices.symbols()
    }

    pub fn len(&self) -> usize {
        self.cash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cash.is_empty()
    }

    pub fn prices(&self) -> &PricePanel {
        &self.prices
    }

    pub fn raw_signals(&self) -> &SignalPanel {
        &self.raw_signals
    }

    pub fn executed_signals(&self) -> &SignalPanel {
        &self.executed_signals
    }

    pub fn trades(&self) -> &Panel<i64> {
        &self.trades
    }

    pub fn holdings(&self) -> &Panel<i64> {
        &self.holdings
    }

    pub fn cash(&self) -> &[f64] {
        &self.cash
    }

    pub fn total_assets(&self) -> &[f64] {
        &self.total_assets
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Last total-assets value, or the initial cash for an empty run.
    pub fn final_value(&self) -> f64 {
        self.total_assets
            .last()
            .copied()
            .unwrap_or(self.config.initial_cash)
    }

    pub fn row_at(&self, t: usize) -> Option<LedgerRow<'_>> {
        if t >= self.len() {
            return None;
        }
        Some(LedgerRow {
            date: self.dates()[t],
            symbols: self.symbols(),
            prices: self.prices.row(t),
            raw_signals: self.raw_signals.row(t),
            executed_signals: self.executed_signals.row(t),
            trades: self.trades.row(t),
            holdings: self.holdings.row(t),
            cash: self.cash[t],
            total_assets: self.total_assets[t],
        })
    }

    pub fn row(&self, date: NaiveDate) -> Option<LedgerRow<'_>> {
        let t = self.prices.panel().date_index(date)?;
        self.row_at(t)
    }

    pub fn instrument(&self, symbol: &str) -> Option<InstrumentTrail> {
        let i = self.prices.panel().symbol_index(symbol)?;
        Some(InstrumentTrail {
            symbol: symbol.to_string(),
            prices: self.prices.column(i),
            raw_signals: self.raw_signals.column(i),
            executed_signals: self.executed_signals.column(i),
            trades: self.trades.column(i),
            holdings: self.holdings.column(i),
        })
    }

    /// Verify holdings ≥ 0, cash ≥ 0, holdings continuity, the accounting
    /// identity, and (when lagged) a flat first executed row.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let symbols = self.symbols();
        for t in 0..self.len() {
            let date = self.dates()[t];
            let cash = self.cash[t];
            if cash < 0.0 {
                return Err(InvariantViolation::NegativeCash { date, cash });
            }

            let row = self.holdings.row(t);
            let trades = self.trades.row(t);
            for (i, (&held, &traded)) in row.iter().zip(trades).enumerate() {
                if held < 0 {
                    return Err(InvariantViolation::NegativeHoldings {
                        date,
                        symbol: symbols[i].clone(),
                        holdings: held,
                    });
                }
                let prev = if t == 0 { 0 } else { self.holdings.get(t - 1, i) };
                if held != prev + traded {
                    return Err(InvariantViolation::Discontinuity {
                        date,
                        symbol: symbols[i].clone(),
                    });
                }
            }

            let expected = cash + position_value(row, self.prices.row(t));
            let actual = self.total_assets[t];
            if (expected - actual).abs() > 1e-6 * expected.abs().max(1.0) {
                return Err(InvariantViolation::Conservation {
                    date,
                    expected,
                    actual,
                });
            }
        }

        if self.config.act_on_previous_signal && !self.is_empty() {
            if let Some((i, &signal)) = self
                .executed_signals
                .row(0)
                .iter()
                .enumerate()
                .find(|&(_, &s)| s != 0)
            {
                return Err(InvariantViolation::LookAhead {
                    symbol: symbols[i].clone(),
                    signal,
                });
            }
        }
        Ok(())
    }

    /// BLAKE3 over the run identity and every cell, in a fixed order.
    pub fn fingerprint(&self) -> LedgerHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.strategy.as_bytes());
        hasher.update(&[0]);
        if let Ok(config) = serde_json::to_string(&self.config) {
            hasher.update(config.as_bytes());
        }
        hasher.update(self.prices.dataset_hash().0.as_bytes());

        for &s in self
            .raw_signals
            .values()
            .iter()
            .chain(self.executed_signals.values())
        {
            hasher.update(&s.to_le_bytes());
        }
        for &v in self.trades.values().iter().chain(self.holdings.values()) {
            hasher.update(&v.to_le_bytes());
        }
        for &v in self.cash.iter().chain(&self.total_assets) {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        LedgerHash::from_hasher(&hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::daily_dates;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn prices() -> PricePanel {
        PricePanel::from_columns(
            daily_dates(start(), 2),
            vec![
                ("AAA".into(), vec![10.0, 12.0]),
                ("BBB".into(), vec![5.0, f64::NAN]),
            ],
        )
        .unwrap()
    }

    fn ledger() -> Ledger {
        let prices = prices();
        let signals: SignalPanel = Panel::like(prices.panel(), 0);
        let trades =
            Panel::new(prices.dates().to_vec(), prices.symbols().to_vec(), vec![1, 2, 0, 0])
                .unwrap();
        let holdings =
            Panel::new(prices.dates().to_vec(), prices.symbols().to_vec(), vec![1, 2, 1, 2])
                .unwrap();
        assemble(&prices, &signals, &signals, trades, holdings, vec![80.0, 80.0]).unwrap()
    }

    #[test]
    fn total_assets_marks_to_market() {
        let ledger = ledger();
        // Day 0: 80 + 1*10 + 2*5. Day 1: 80 + 1*12, BBB missing contributes 0.
        assert_eq!(ledger.total_assets(), &[100.0, 92.0]);
        assert_eq!(ledger.final_value(), 92.0);
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn accessors_by_date_and_instrument() {
        let ledger = ledger();
        let row = ledger.row(start() + chrono::Duration::days(1)).unwrap();
        assert_eq!(row.holdings, &[1, 2]);
        assert_eq!(row.cash, 80.0);
        assert!(ledger.row(start() - chrono::Duration::days(1)).is_none());
        assert!(ledger.row_at(2).is_none());

        let trail = ledger.instrument("BBB").unwrap();
        assert_eq!(trail.trades, vec![2, 0]);
        assert_eq!(trail.holdings, vec![2, 2]);
        assert!(ledger.instrument("ZZZ").is_none());
    }

    #[test]
    fn assemble_rejects_short_cash_series() {
        let prices = prices();
        let signals: SignalPanel = Panel::like(prices.panel(), 0);
        let zeros: Panel<i64> = Panel::like(prices.panel(), 0);
        let err = assemble(&prices, &signals, &signals, zeros.clone(), zeros, vec![1.0])
            .unwrap_err();
        assert!(matches!(err, BacktestError::ShapeMismatch(_)));
    }

    #[test]
    fn assemble_rejects_foreign_index() {
        let prices = prices();
        let other = PricePanel::from_columns(
            daily_dates(start(), 2),
            vec![("AAA".into(), vec![1.0, 1.0])],
        )
        .unwrap();
        let signals: SignalPanel = Panel::like(other.panel(), 0);
        let zeros: Panel<i64> = Panel::like(prices.panel(), 0);
        let err = assemble(&prices, &signals, &signals, zeros.clone(), zeros, vec![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, BacktestError::ShapeMismatch(_)));
    }

    #[test]
    fn invariant_check_catches_discontinuity() {
        let prices = prices();
        let signals: SignalPanel = Panel::like(prices.panel(), 0);
        let trades: Panel<i64> = Panel::like(prices.panel(), 0);
        let holdings =
            Panel::new(prices.dates().to_vec(), prices.symbols().to_vec(), vec![0, 0, 1, 0])
                .unwrap();
        let ledger =
            assemble(&prices, &signals, &signals, trades, holdings, vec![1.0, 1.0]).unwrap();
        assert!(matches!(
            ledger.check_invariants(),
            Err(InvariantViolation::Discontinuity { .. })
        ));
    }

    #[test]
    fn invariant_check_catches_negative_cash() {
        let prices = prices();
        let signals: SignalPanel = Panel::like(prices.panel(), 0);
        let zeros: Panel<i64> = Panel::like(prices.panel(), 0);
        let ledger =
            assemble(&prices, &signals, &signals, zeros.clone(), zeros, vec![1.0, -0.5]).unwrap();
        assert!(matches!(
            ledger.check_invariants(),
            Err(InvariantViolation::NegativeCash { .. })
        ));
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = ledger();
        let b = ledger();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = a.clone().with_run_info("other", ExecutionConfig::default());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
