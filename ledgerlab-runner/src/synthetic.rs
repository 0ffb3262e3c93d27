//! Synthetic price series for offline runs and tests.
//!
//! Each symbol gets a geometric random walk from its own RNG. Sub-seeds are
//! derived with BLAKE3 from `(master seed, symbol)`, so a symbol's series does
//! not depend on which other symbols were generated or in what order.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use ledgerlab_core::domain::Symbol;
use ledgerlab_core::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticOptions {
    pub symbols: Vec<Symbol>,
    /// Trading days per series (weekends are skipped).
    pub days: usize,
    pub start: NaiveDate,
    pub seed: u64,
    pub start_price: f64,
    /// Half-width of the uniform daily return, e.g. 0.03 for ±3%.
    pub daily_range: f64,
}

impl SyntheticOptions {
    pub fn new(symbols: Vec<Symbol>, days: usize) -> Self {
        Self {
            symbols,
            days,
            ..Self::default()
        }
    }
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            symbols: ["AAA", "BBB", "CCC", "DDD"].map(String::from).to_vec(),
            days: 750,
            start: NaiveDate::from_ymd_opt(2015, 1, 2).unwrap_or(NaiveDate::MIN),
            seed: 42,
            start_price: 100.0,
            daily_range: 0.03,
        }
    }
}

/// Deterministic sub-seed for one symbol.
pub fn sub_seed(master_seed: u64, symbol: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    *hasher.finalize().as_bytes()
}

pub fn synthetic_series(symbol: &str, opts: &SyntheticOptions) -> PriceSeries {
    let mut rng = StdRng::from_seed(sub_seed(opts.seed, symbol));
    let mut pairs = Vec::with_capacity(opts.days);
    let mut price = opts.start_price;
    let mut date = opts.start;

    while pairs.len() < opts.days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            pairs.push((date, price));
            let daily_return: f64 = if opts.daily_range > 0.0 {
                rng.gen_range(-opts.daily_range..opts.daily_range)
            } else {
                0.0
            };
            price *= 1.0 + daily_return;
        }
        date += chrono::Duration::days(1);
    }
    PriceSeries::from_pairs(pairs)
}

pub fn synthetic_universe(opts: &SyntheticOptions) -> BTreeMap<Symbol, PriceSeries> {
    opts.symbols
        .iter()
        .map(|s| (s.clone(), synthetic_series(s, opts)))
        .collect()
}
