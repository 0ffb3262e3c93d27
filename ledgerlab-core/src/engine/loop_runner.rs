//! Day-by-day execution loop: the heart of the backtester.
//!
//! One straight-line fold over dates carrying `(cash, holdings)`. Per date:
//! 1. Validate prices: negative or infinite aborts the run; NaN is "missing"
//! 2. Desire vector: clamp the executed signal, size it, floor at `-holdings`
//! 3. Sell pass: every sell settles before any buy, freeing cash
//! 4. Buy pass: admission control in sorted-identifier order
//! 5. Snapshot trades, holdings and cash

use tracing::{debug, trace};

use super::admission::{admit_buys, Admission};
use super::config::{ExecutionConfig, SellPolicy};
use super::state::Book;
use crate::domain::{Fill, Side};
use crate::error::BacktestError;
use crate::ledger::{assemble, Ledger};
use crate::normalize::{normalize, reindex_signals};
use crate::panel::{Panel, PricePanel, SignalPanel};
use crate::strategies::SignalSource;

/// Raw engine output, before ledger assembly.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Signed share delta per date and instrument.
    pub trades: Panel<i64>,
    /// End-of-day share count per date and instrument.
    pub holdings: Panel<i64>,
    /// End-of-day cash per date.
    pub cash: Vec<f64>,
    /// Every executed order in execution order.
    pub fills: Vec<Fill>,
}

/// Run a full backtest: signals once, normalize, execute, assemble.
///
/// All-or-nothing: any error means no ledger.
pub fn run_backtest(
    prices: &PricePanel,
    source: &dyn SignalSource,
    config: &ExecutionConfig,
) -> Result<Ledger, BacktestError> {
    config.validate()?;
    let (n_dates, n_symbols) = prices.shape();
    debug!(
        strategy = source.name(),
        dates = n_dates,
        instruments = n_symbols,
        initial_cash = config.initial_cash,
        "starting backtest"
    );

    let raw = source.compute_signals(prices);
    let raw_trail = reindex_signals(&raw, prices)?;
    let executed = normalize(&raw, prices, config.act_on_previous_signal)?;
    let execution = execute(prices, &executed, config)?;

    let ledger = assemble(
        prices,
        &raw_trail,
        &executed,
        execution.trades,
        execution.holdings,
        execution.cash,
    )?
    .with_fills(execution.fills)
    .with_run_info(source.name(), config.clone());

    debug!(
        strategy = source.name(),
        final_value = ledger.final_value(),
        fills = ledger.fills().len(),
        "backtest complete"
    );
    Ok(ledger)
}

/// Execute already-normalized signals against prices.
///
/// `executed` must be on exactly the price panel's index; the engine never
/// lags or reindexes on its own.
pub fn execute(
    prices: &PricePanel,
    executed: &SignalPanel,
    config: &ExecutionConfig,
) -> Result<Execution, BacktestError> {
    config.validate()?;
    if !executed.same_index(prices.panel()) {
        return Err(BacktestError::ShapeMismatch(format!(
            "executed signals are {:?}, prices are {:?} (or labels differ)",
            executed.shape(),
            prices.shape()
        )));
    }

    let (n_dates, n_symbols) = prices.shape();
    let symbols = prices.symbols();
    let priority = priority_order(symbols);

    let mut book = Book::new(config.initial_cash, n_symbols);
    let mut trades: Panel<i64> = Panel::like(prices.panel(), 0);
    let mut holdings: Panel<i64> = Panel::like(prices.panel(), 0);
    let mut cash = Vec::with_capacity(n_dates);
    let mut fills = Vec::new();

    for t in 0..n_dates {
        let date = prices.dates()[t];
        let px = prices.row(t);
        validate_prices(prices, t)?;

        let desire = desire_vector(executed.row(t), book.holdings(), config);
        let day_trades = trades.row_mut(t);

        // Sells first, whatever the instrument order.
        for i in 0..n_symbols {
            if desire[i] >= 0 {
                continue;
            }
            if px[i].is_nan() {
                trace!(%date, symbol = %symbols[i], "sell dropped: missing price");
                continue;
            }
            let sold = book.sell(i, -desire[i], px[i]);
            if sold > 0 {
                day_trades[i] = -sold;
                fills.push(Fill {
                    date,
                    symbol: symbols[i].clone(),
                    side: Side::Sell,
                    quantity: sold,
                    price: px[i],
                    cash_after: book.cash(),
                });
            }
        }

        for outcome in admit_buys(&mut book, &desire, px, &priority, config.buy_admission) {
            match outcome {
                Admission::Filled {
                    i,
                    quantity,
                    price,
                    cash_after,
                } => {
                    day_trades[i] += quantity;
                    fills.push(Fill {
                        date,
                        symbol: symbols[i].clone(),
                        side: Side::Buy,
                        quantity,
                        price,
                        cash_after,
                    });
                }
                Admission::InsufficientCash { i, price } => {
                    trace!(%date, symbol = %symbols[i], price, "buy skipped: insufficient cash");
                }
                Admission::MissingPrice { i } => {
                    trace!(%date, symbol = %symbols[i], "buy dropped: missing price");
                }
                Admission::Unsizable { i } => {
                    trace!(%date, symbol = %symbols[i], "buy skipped: zero price");
                }
            }
        }

        holdings.row_mut(t).copy_from_slice(book.holdings());
        cash.push(book.cash());
    }

    Ok(Execution {
        trades,
        holdings,
        cash,
        fills,
    })
}

/// Per-instrument share delta the executed signals ask for today.
///
/// Buys are sized by `max_buy_per_tick`; sells by `max_sell_per_tick` (or the
/// whole position under `Liquidate`), and never below `-holdings` so a sell
/// on a flat position is a no-op rather than a short.
pub fn desire_vector(signals: &[i8], holdings: &[i64], config: &ExecutionConfig) -> Vec<i64> {
    signals
        .iter()
        .zip(holdings)
        .map(|(&sig, &held)| match sig.clamp(-1, 1) {
            1 => i64::from(config.max_buy_per_tick),
            -1 => {
                let want = match config.sell_policy {
                    SellPolicy::PerTick => i64::from(config.max_sell_per_tick),
                    SellPolicy::Liquidate => held,
                };
                (-want).max(-held)
            }
            _ => 0,
        })
        .collect()
}

/// Column indices sorted by instrument identifier.
fn priority_order(symbols: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..symbols.len()).collect();
    order.sort_by(|&a, &b| symbols[a].cmp(&symbols[b]));
    order
}

fn validate_prices(prices: &PricePanel, t: usize) -> Result<(), BacktestError> {
    for (i, &price) in prices.row(t).iter().enumerate() {
        if price.is_nan() {
            continue;
        }
        if price < 0.0 || price.is_infinite() {
            return Err(BacktestError::InvalidPrice {
                date: prices.dates()[t],
                symbol: prices.symbols()[i].clone(),
                price,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::daily_dates;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn single(prices: &[f64]) -> PricePanel {
        PricePanel::from_columns(
            daily_dates(start(), prices.len()),
            vec![("AAA".into(), prices.to_vec())],
        )
        .unwrap()
    }

    fn signals(prices: &PricePanel, cols: Vec<Vec<i8>>) -> SignalPanel {
        let columns = prices.symbols().iter().cloned().zip(cols).collect();
        Panel::from_columns(prices.dates().to_vec(), columns).unwrap()
    }

    #[test]
    fn desire_floors_sells_at_holdings() {
        let config = ExecutionConfig::default();
        assert_eq!(desire_vector(&[1, 0, -1, -1], &[0, 3, 0, 2], &config), vec![1, 0, 0, -1]);
    }

    #[test]
    fn desire_respects_tick_caps() {
        let config = ExecutionConfig {
            max_buy_per_tick: 3,
            max_sell_per_tick: 2,
            ..ExecutionConfig::default()
        };
        assert_eq!(desire_vector(&[1, -1, -1], &[0, 5, 1], &config), vec![3, -2, -1]);

        let frozen = ExecutionConfig {
            max_buy_per_tick: 0,
            max_sell_per_tick: 0,
            ..ExecutionConfig::default()
        };
        assert_eq!(desire_vector(&[1, -1], &[0, 5], &frozen), vec![0, 0]);
    }

    #[test]
    fn liquidate_sells_whole_position() {
        let config = ExecutionConfig {
            sell_policy: SellPolicy::Liquidate,
            ..ExecutionConfig::default()
        };
        assert_eq!(desire_vector(&[-1, -1], &[4, 0], &config), vec![-4, 0]);
    }

    #[test]
    fn sells_fund_same_day_buys() {
        let prices = PricePanel::from_columns(
            daily_dates(start(), 2),
            vec![
                ("AAA".into(), vec![10.0, 10.0]),
                ("BBB".into(), vec![10.0, 10.0]),
            ],
        )
        .unwrap();
        // Day 0: buy AAA with all the cash. Day 1: sell AAA, buy BBB.
        let exec = signals(&prices, vec![vec![1, -1], vec![0, 1]]);
        let out = execute(&prices, &exec, &ExecutionConfig::with_cash(10.0)).unwrap();

        assert_eq!(out.trades.row(1), &[-1, 1]);
        assert_eq!(out.holdings.row(1), &[0, 1]);
        assert_eq!(out.cash, vec![0.0, 0.0]);
    }

    #[test]
    fn fills_record_running_cash() {
        let prices = PricePanel::from_columns(
            daily_dates(start(), 1),
            vec![("AAA".into(), vec![10.0]), ("BBB".into(), vec![20.0])],
        )
        .unwrap();
        let exec = signals(&prices, vec![vec![1], vec![1]]);
        let out = execute(&prices, &exec, &ExecutionConfig::with_cash(100.0)).unwrap();

        assert_eq!(out.fills.len(), 2);
        assert_eq!(out.fills[0].symbol, "AAA");
        assert_eq!(out.fills[0].cash_after, 90.0);
        assert_eq!(out.fills[1].symbol, "BBB");
        assert_eq!(out.fills[1].cash_after, 70.0);
    }

    #[test]
    fn negative_price_aborts() {
        let prices = single(&[10.0, -1.0, 10.0]);
        let exec = signals(&prices, vec![vec![0, 0, 0]]);
        let err = execute(&prices, &exec, &ExecutionConfig::default()).unwrap_err();
        assert_eq!(
            err,
            BacktestError::InvalidPrice {
                date: start() + chrono::Duration::days(1),
                symbol: "AAA".into(),
                price: -1.0,
            }
        );
    }

    #[test]
    fn infinite_price_aborts() {
        let prices = single(&[f64::INFINITY]);
        let exec = signals(&prices, vec![vec![0]]);
        let err = execute(&prices, &exec, &ExecutionConfig::default()).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidPrice { .. }));
    }

    #[test]
    fn mismatched_signal_index_aborts() {
        let prices = single(&[10.0, 10.0]);
        let other = single(&[10.0, 10.0, 10.0]);
        let exec = signals(&other, vec![vec![0, 0, 0]]);
        let err = execute(&prices, &exec, &ExecutionConfig::default()).unwrap_err();
        assert!(matches!(err, BacktestError::ShapeMismatch(_)));
    }

    #[test]
    fn invalid_config_aborts() {
        let prices = single(&[10.0]);
        let exec = signals(&prices, vec![vec![0]]);
        let err = execute(&prices, &exec, &ExecutionConfig::with_cash(0.0)).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidConfig(_)));
    }

    #[test]
    fn priority_is_sorted_by_identifier() {
        let symbols: Vec<String> = vec!["MSFT".into(), "AAPL".into(), "GOOG".into()];
        assert_eq!(priority_order(&symbols), vec![1, 2, 0]);
    }
}
