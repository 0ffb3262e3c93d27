//! Performance metrics: pure functions over a ledger's total-assets series.
//!
//! The curve always starts at the configured initial cash.

use serde::{Deserialize, Serialize};

use ledgerlab_core::domain::Side;
use ledgerlab_core::Ledger;

/// Headline numbers for one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub buy_count: usize,
    pub sell_count: usize,
    pub trading_days: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finished ledger.
    ///
    /// The curve starts from the configured initial cash, so a buy on the
    /// first date is measured against money, not against itself.
    pub fn compute(ledger: &Ledger) -> Self {
        let initial = ledger.config().initial_cash;
        let curve: Vec<f64> = std::iter::once(initial)
            .chain(ledger.total_assets().iter().copied())
            .collect();
        let trading_days = ledger.len();
        let fills = ledger.fills();
        Self {
            initial_value: initial,
            final_value: ledger.final_value(),
            total_return: total_return(&curve),
            cagr: cagr(&curve, trading_days),
            sharpe: sharpe_ratio(&curve, 0.0),
            max_drawdown: max_drawdown(&curve),
            buy_count: fills.iter().filter(|f| f.side == Side::Buy).count(),
            sell_count: fills.iter().filter(|f| f.side == Side::Sell).count(),
            trading_days,
        }
    }
}

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// `last / first - 1`; zero for a curve shorter than two points or a
/// non-positive start.
pub fn total_return(curve: &[f64]) -> f64 {
    match curve {
        [first, .., last] if *first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Annualized growth over `trading_days` sessions.
pub fn cagr(curve: &[f64], trading_days: usize) -> f64 {
    let [first, .., last] = curve else {
        return 0.0;
    };
    if trading_days < 2 || *first <= 0.0 || *last <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    (last / first).powf(years.recip()) - 1.0
}

/// Annualized Sharpe ratio of step returns against a yearly risk-free rate.
/// Zero when there are fewer than two returns or no dispersion.
pub fn sharpe_ratio(curve: &[f64], risk_free_rate: f64) -> f64 {
    let per_day_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = daily_returns(curve)
        .into_iter()
        .map(|r| r - per_day_rf)
        .collect();
    let sd = sample_std(&excess);
    if excess.len() < 2 || sd < 1e-15 {
        return 0.0;
    }
    mean(&excess) / sd * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Deepest peak-to-trough fall, as a fraction in `[-1, 0]`.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    curve
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &v| {
            *peak = peak.max(v);
            Some(if *peak > 0.0 { v / *peak - 1.0 } else { 0.0 })
        })
        .fold(0.0, f64::min)
}

/// Step-over-step returns; a non-positive base yields 0.
pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (xs.len() - 1) as f64).sqrt()
}
