//! Multi-instrument price alignment.
//!
//! Turns a map of per-instrument series into one `PricePanel`. Two policies:
//! - `TrailingWindow`: every instrument keeps its most recent N prices, where
//!   N is the shortest qualifying series. Rows are matched by position.
//! - `DateUnion`: rows are the union of all dates; an instrument without a
//!   price on a date gets strict NaN (no forward-fill of tradable prices).
//!
//! Columns are always sorted by identifier so runs are reproducible.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use super::price::{PricePanel, PriceSeries};
use crate::domain::Symbol;
use crate::error::BacktestError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignPolicy {
    #[default]
    TrailingWindow,
    DateUnion,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignOptions {
    /// Minimum non-missing observations an instrument needs to be included.
    /// Zero is treated as one: an instrument with no prices never qualifies.
    pub min_history: usize,
    /// Instruments that must be included; falling short is an error for
    /// these instead of a silent drop.
    pub required: BTreeSet<Symbol>,
    pub policy: AlignPolicy,
}

impl AlignOptions {
    pub fn with_min_history(min_history: usize) -> Self {
        Self {
            min_history,
            ..Self::default()
        }
    }
}

/// Align a set of price series into a panel.
pub fn align_prices(
    series: &BTreeMap<Symbol, PriceSeries>,
    opts: &AlignOptions,
) -> Result<PricePanel, BacktestError> {
    let threshold = opts.min_history.max(1);

    for symbol in &opts.required {
        if !series.contains_key(symbol) {
            return Err(BacktestError::InsufficientHistory {
                symbol: symbol.clone(),
                observations: 0,
                min_history: opts.min_history,
            });
        }
    }

    let mut qualifying: Vec<(&Symbol, &PriceSeries)> = Vec::with_capacity(series.len());
    for (symbol, s) in series {
        let observations = s.observations();
        if observations >= threshold {
            qualifying.push((symbol, s));
        } else if opts.required.contains(symbol) {
            return Err(BacktestError::InsufficientHistory {
                symbol: symbol.clone(),
                observations,
                min_history: opts.min_history,
            });
        } else {
            warn!(
                symbol = %symbol,
                observations,
                min_history = opts.min_history,
                "dropping instrument with insufficient history"
            );
        }
    }

    if qualifying.is_empty() {
        return Err(BacktestError::EmptyUniverse {
            min_history: opts.min_history,
        });
    }

    match opts.policy {
        AlignPolicy::TrailingWindow => align_trailing(&qualifying),
        AlignPolicy::DateUnion => align_union(&qualifying),
    }
}

/// Most-recent-N alignment. The shortest series (first by identifier on a
/// tie) supplies the date index.
fn align_trailing(qualifying: &[(&Symbol, &PriceSeries)]) -> Result<PricePanel, BacktestError> {
    let (_, shortest) = qualifying
        .iter()
        .min_by_key(|(_, s)| s.len())
        .ok_or(BacktestError::EmptyUniverse { min_history: 0 })?;
    let n = shortest.len();
    let dates = shortest.dates().to_vec();

    let columns = qualifying
        .iter()
        .map(|(symbol, s)| ((*symbol).clone(), s.trailing(n).1.to_vec()))
        .collect();

    PricePanel::from_columns(dates, columns)
}

fn align_union(qualifying: &[(&Symbol, &PriceSeries)]) -> Result<PricePanel, BacktestError> {
    let all_dates: BTreeSet<NaiveDate> = qualifying
        .iter()
        .flat_map(|(_, s)| s.dates().iter().copied())
        .collect();
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    let columns = qualifying
        .iter()
        .map(|(symbol, s)| {
            let by_date: HashMap<NaiveDate, f64> = s
                .dates()
                .iter()
                .copied()
                .zip(s.prices().iter().copied())
                .collect();
            let column = dates
                .iter()
                .map(|date| by_date.get(date).copied().unwrap_or(f64::NAN))
                .collect();
            ((*symbol).clone(), column)
        })
        .collect();

    PricePanel::from_columns(dates, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::daily_dates;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn series(offset: i64, prices: &[f64]) -> PriceSeries {
        let dates = daily_dates(start() + chrono::Duration::days(offset), prices.len());
        PriceSeries::new(dates, prices.to_vec()).unwrap()
    }

    fn universe() -> BTreeMap<Symbol, PriceSeries> {
        let mut map = BTreeMap::new();
        map.insert("MSFT".into(), series(0, &[1.0, 2.0, 3.0, 4.0, 5.0]));
        map.insert("AAPL".into(), series(2, &[30.0, 40.0, 50.0]));
        map
    }

    #[test]
    fn trailing_window_keeps_most_recent_prices() {
        let panel = align_prices(&universe(), &AlignOptions::with_min_history(2)).unwrap();

        assert_eq!(panel.symbols(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(panel.shape(), (3, 2));
        assert_eq!(panel.column(0), vec![30.0, 40.0, 50.0]);
        assert_eq!(panel.column(1), vec![3.0, 4.0, 5.0]);
        assert_eq!(panel.dates(), daily_dates(start() + chrono::Duration::days(2), 3));
    }

    #[test]
    fn short_optional_instrument_is_dropped() {
        let panel = align_prices(&universe(), &AlignOptions::with_min_history(4)).unwrap();
        assert_eq!(panel.symbols(), &["MSFT".to_string()]);
        assert_eq!(panel.n_dates(), 5);
    }

    #[test]
    fn short_required_instrument_fails() {
        let opts = AlignOptions {
            min_history: 4,
            required: ["AAPL".to_string()].into_iter().collect(),
            policy: AlignPolicy::TrailingWindow,
        };
        let err = align_prices(&universe(), &opts).unwrap_err();
        assert_eq!(
            err,
            BacktestError::InsufficientHistory {
                symbol: "AAPL".into(),
                observations: 3,
                min_history: 4,
            }
        );
    }

    #[test]
    fn absent_required_instrument_fails() {
        let opts = AlignOptions {
            min_history: 1,
            required: ["NVDA".to_string()].into_iter().collect(),
            policy: AlignPolicy::TrailingWindow,
        };
        let err = align_prices(&universe(), &opts).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientHistory { observations: 0, .. }));
    }

    #[test]
    fn nobody_qualifies() {
        let err = align_prices(&universe(), &AlignOptions::with_min_history(2500)).unwrap_err();
        assert_eq!(err, BacktestError::EmptyUniverse { min_history: 2500 });

        let err = align_prices(&BTreeMap::new(), &AlignOptions::default()).unwrap_err();
        assert!(matches!(err, BacktestError::EmptyUniverse { .. }));
    }

    #[test]
    fn missing_values_do_not_count_as_history() {
        let mut map = BTreeMap::new();
        map.insert("GAPS".into(), series(0, &[1.0, f64::NAN, f64::NAN]));
        let err = align_prices(&map, &AlignOptions::with_min_history(2)).unwrap_err();
        assert!(matches!(err, BacktestError::EmptyUniverse { .. }));
    }

    #[test]
    fn date_union_fills_missing_with_nan() {
        let opts = AlignOptions {
            min_history: 1,
            policy: AlignPolicy::DateUnion,
            ..AlignOptions::default()
        };
        let panel = align_prices(&universe(), &opts).unwrap();

        assert_eq!(panel.shape(), (5, 2));
        assert_eq!(panel.price_at(0, 0), None);
        assert_eq!(panel.price_at(1, 0), None);
        assert_eq!(panel.price_at(2, 0), Some(30.0));
        assert_eq!(panel.price_at(0, 1), Some(1.0));
    }
}
