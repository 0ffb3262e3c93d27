//! Backtest runner: wires together config, prices, strategies and metrics.
//!
//! Two entry points:
//! - `run_session()`: loads prices from the configured directory, then runs.
//! - `run_on_prices()`: takes an already aligned panel. Used for synthetic
//!   data and tests.
//!
//! Strategies run in parallel on the rayon pool. Each run owns its own book;
//! the only shared state is the read-only `PricePanel`.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, info};

use ledgerlab_core::domain::{DatasetHash, LedgerHash};
use ledgerlab_core::{run_backtest, BacktestError, Ledger, PricePanel, SignalSource};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_prices, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy '{label}' could not be built: {source}")]
    Strategy {
        label: String,
        source: BacktestError,
    },
}

/// One finished strategy run.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    /// Unique within the session: the strategy name, suffixed on repeats.
    pub label: String,
    pub ledger: Ledger,
    pub metrics: PerformanceMetrics,
    pub fingerprint: LedgerHash,
}

/// A strategy run that aborted. Other strategies are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub label: String,
    pub error: String,
}

/// Everything one session produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub dataset_hash: DatasetHash,
    pub runs: Vec<StrategyRun>,
    pub failures: Vec<RunFailure>,
}

impl RunOutcome {
    pub fn get(&self, label: &str) -> Option<&StrategyRun> {
        self.runs.iter().find(|r| r.label == label)
    }
}

/// Load prices per `config.data`, then run every configured strategy.
pub fn run_session(config: &BacktestConfig) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let prices = load_prices(&config.data)?;
    run_on_prices(config, &prices)
}

/// Run every configured strategy over an aligned panel.
///
/// Strategy construction errors abort the session; a strategy whose run
/// fails is reported in `failures` and the rest still complete.
pub fn run_on_prices(config: &BacktestConfig, prices: &PricePanel) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;

    let labels = unique_labels(config.strategies.iter().map(|s| s.name()));
    let sources: Vec<(String, Box<dyn SignalSource>)> = labels
        .into_iter()
        .zip(&config.strategies)
        .map(|(label, spec)| match spec.build() {
            Ok(source) => Ok((label, source)),
            Err(source) => Err(RunError::Strategy { label, source }),
        })
        .collect::<Result<_, _>>()?;

    info!(
        run_id = %run_id,
        strategies = sources.len(),
        instruments = prices.n_symbols(),
        dates = prices.n_dates(),
        "starting session"
    );

    let results: Vec<(String, Result<Ledger, BacktestError>)> = sources
        .par_iter()
        .map(|(label, source)| {
            (
                label.clone(),
                run_backtest(prices, source.as_ref(), &config.execution),
            )
        })
        .collect();

    let mut runs = Vec::new();
    let mut failures = Vec::new();
    for (label, result) in results {
        match result {
            Ok(ledger) => {
                let metrics = PerformanceMetrics::compute(&ledger);
                info!(
                    strategy = %label,
                    final_value = metrics.final_value,
                    total_return = metrics.total_return,
                    buys = metrics.buy_count,
                    sells = metrics.sell_count,
                    "strategy complete"
                );
                runs.push(StrategyRun {
                    fingerprint: ledger.fingerprint(),
                    label,
                    ledger,
                    metrics,
                });
            }
            Err(err) => {
                error!(strategy = %label, error = %err, "strategy failed");
                failures.push(RunFailure {
                    label,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(RunOutcome {
        run_id,
        dataset_hash: prices.dataset_hash(),
        runs,
        failures,
    })
}

/// Strategy names made unique by suffixing repeats: `macd`, `macd_2`, ...
fn unique_labels<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    names
        .map(|name| {
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            if *count == 1 {
                name.to_string()
            } else {
                format!("{name}_{count}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique_and_stable() {
        let labels = unique_labels(["macd", "buy_once", "macd", "macd"].into_iter());
        assert_eq!(labels, vec!["macd", "buy_once", "macd_2", "macd_3"]);
    }
}
