//! Price panel and per-instrument price series.

use chrono::NaiveDate;
use serde::Serialize;

use super::Panel;
use crate::domain::{DatasetHash, Symbol};
use crate::error::BacktestError;

/// Ordered daily prices for one instrument, before alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Fails unless `dates` is strictly increasing and matches `prices` in length.
    pub fn new(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self, BacktestError> {
        if dates.len() != prices.len() {
            return Err(BacktestError::ShapeMismatch(format!(
                "{} dates for {} prices",
                dates.len(),
                prices.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BacktestError::InvalidIndex(format!(
                "series dates must be strictly increasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { dates, prices })
    }

    /// Sort `(date, price)` pairs by date, keeping the first price seen for a
    /// duplicated date.
    pub fn from_pairs(mut pairs: Vec<(NaiveDate, f64)>) -> Self {
        pairs.sort_by_key(|(date, _)| *date);
        pairs.dedup_by_key(|(date, _)| *date);
        let (dates, prices) = pairs.into_iter().unzip();
        Self { dates, prices }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Number of non-missing prices.
    pub fn observations(&self) -> usize {
        self.prices.iter().filter(|p| !p.is_nan()).count()
    }

    /// The most recent `n` entries (or all of them if shorter).
    pub fn trailing(&self, n: usize) -> (&[NaiveDate], &[f64]) {
        let start = self.len().saturating_sub(n);
        (&self.dates[start..], &self.prices[start..])
    }
}

/// Immutable, aligned price table. Missing prices are `NaN`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PricePanel(Panel<f64>);

impl PricePanel {
    /// Build from an already-aligned row-major table.
    pub fn from_table(
        dates: Vec<NaiveDate>,
        symbols: Vec<Symbol>,
        values: Vec<f64>,
    ) -> Result<Self, BacktestError> {
        Panel::new(dates, symbols, values).map(Self)
    }

    /// Build from one price column per instrument.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(Symbol, Vec<f64>)>,
    ) -> Result<Self, BacktestError> {
        Panel::from_columns(dates, columns).map(Self)
    }

    pub fn panel(&self) -> &Panel<f64> {
        &self.0
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.0.dates()
    }

    pub fn symbols(&self) -> &[Symbol] {
        self.0.symbols()
    }

    pub fn n_dates(&self) -> usize {
        self.0.n_dates()
    }

    pub fn n_symbols(&self) -> usize {
        self.0.n_symbols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    pub fn row(&self, t: usize) -> &[f64] {
        self.0.row(t)
    }

    pub fn column(&self, i: usize) -> Vec<f64> {
        self.0.column(i)
    }

    /// Price at `(date, symbol)`; `None` when missing or either label is unknown.
    pub fn price(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        self.0.lookup(date, symbol).filter(|p| !p.is_nan())
    }

    /// Price at row `t`, column `i`; `None` when missing.
    pub fn price_at(&self, t: usize, i: usize) -> Option<f64> {
        let p = self.0.get(t, i);
        (!p.is_nan()).then_some(p)
    }

    /// Non-missing prices in column `i`.
    pub fn observations(&self, i: usize) -> usize {
        (0..self.n_dates())
            .filter(|&t| !self.0.get(t, i).is_nan())
            .count()
    }

    /// BLAKE3 over the index and every price bit pattern.
    pub fn dataset_hash(&self) -> DatasetHash {
        let mut hasher = blake3::Hasher::new();
        for date in self.dates() {
            hasher.update(date.to_string().as_bytes());
        }
        for symbol in self.symbols() {
            hasher.update(symbol.as_bytes());
            hasher.update(&[0]);
        }
        for value in self.0.values() {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        DatasetHash::from_hasher(&hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn price_accessor_hides_missing() {
        let panel = PricePanel::from_columns(
            vec![d(2), d(3)],
            vec![
                ("AAA".into(), vec![10.0, f64::NAN]),
                ("BBB".into(), vec![20.0, 21.0]),
            ],
        )
        .unwrap();

        assert_eq!(panel.price(d(2), "AAA"), Some(10.0));
        assert_eq!(panel.price(d(3), "AAA"), None);
        assert_eq!(panel.price(d(3), "BBB"), Some(21.0));
        assert_eq!(panel.price(d(9), "BBB"), None);
        assert_eq!(panel.price(d(2), "ZZZ"), None);
        assert_eq!(panel.price_at(1, 0), None);
        assert_eq!(panel.observations(0), 1);
        assert_eq!(panel.observations(1), 2);
    }

    #[test]
    fn series_from_pairs_sorts_and_keeps_first_duplicate() {
        let series = PriceSeries::from_pairs(vec![(d(3), 3.0), (d(2), 2.0), (d(3), 99.0)]);
        assert_eq!(series.dates(), &[d(2), d(3)]);
        assert_eq!(series.prices(), &[2.0, 3.0]);
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let err = PriceSeries::new(vec![d(2)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, BacktestError::ShapeMismatch(_)));
    }

    #[test]
    fn trailing_window() {
        let series = PriceSeries::new(vec![d(2), d(3), d(4)], vec![1.0, 2.0, 3.0]).unwrap();
        let (dates, prices) = series.trailing(2);
        assert_eq!(dates, &[d(3), d(4)]);
        assert_eq!(prices, &[2.0, 3.0]);
        assert_eq!(series.trailing(10).1.len(), 3);
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = PricePanel::from_columns(vec![d(2)], vec![("A".into(), vec![1.0])]).unwrap();
        let b = PricePanel::from_columns(vec![d(2)], vec![("A".into(), vec![1.0])]).unwrap();
        let c = PricePanel::from_columns(vec![d(2)], vec![("A".into(), vec![1.5])]).unwrap();
        assert_eq!(a.dataset_hash(), b.dataset_hash());
        assert_ne!(a.dataset_hash(), c.dataset_hash());
    }
}
