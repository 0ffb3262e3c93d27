//! Date × instrument panels.
//!
//! A `Panel<T>` is a row-major table indexed by strictly increasing dates
//! (rows) and unique instrument identifiers (columns). Prices, signals,
//! trades and holdings are all panels over the same index, which is what lets
//! the engine and the ledger address them by plain `(t, i)` positions.

pub mod align;
pub mod price;

pub use align::{align_prices, AlignOptions, AlignPolicy};
pub use price::{PricePanel, PriceSeries};

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use crate::domain::Symbol;
use crate::error::BacktestError;

/// Whatever a strategy emits: scores per cell, on any index it likes.
pub type RawSignalPanel = Panel<f64>;

/// Executable signals in {-1, 0, 1}, on exactly the price panel's index.
pub type SignalPanel = Panel<i8>;

/// Row-major date × instrument table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel<T> {
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    values: Vec<T>,
}

impl<T: Copy> Panel<T> {
    /// Build a panel from a row-major value vector.
    ///
    /// Fails with `InvalidIndex` if dates are not strictly increasing or
    /// symbols repeat, and with `ShapeMismatch` if the value count is not
    /// `dates.len() * symbols.len()`.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<Symbol>,
        values: Vec<T>,
    ) -> Result<Self, BacktestError> {
        validate_index(&dates, &symbols)?;
        let expected = dates.len() * symbols.len();
        if values.len() != expected {
            return Err(BacktestError::ShapeMismatch(format!(
                "{} values for a {}x{} panel (expected {expected})",
                values.len(),
                dates.len(),
                symbols.len()
            )));
        }
        Ok(Self {
            dates,
            symbols,
            values,
        })
    }

    /// Build a panel from one value vector per instrument.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(Symbol, Vec<T>)>,
    ) -> Result<Self, BacktestError> {
        let n_dates = dates.len();
        if let Some((symbol, col)) = columns.iter().find(|(_, col)| col.len() != n_dates) {
            return Err(BacktestError::ShapeMismatch(format!(
                "column '{symbol}' has {} values for {n_dates} dates",
                col.len()
            )));
        }

        let mut values = Vec::with_capacity(n_dates * columns.len());
        for t in 0..n_dates {
            values.extend(columns.iter().map(|(_, col)| col[t]));
        }
        let symbols = columns.into_iter().map(|(symbol, _)| symbol).collect();
        Self::new(dates, symbols, values)
    }

    /// A panel on `other`'s index with every cell set to `fill`.
    pub fn like<U>(other: &Panel<U>, fill: T) -> Self {
        Self {
            dates: other.dates.clone(),
            symbols: other.symbols.clone(),
            values: vec![fill; other.dates.len() * other.symbols.len()],
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.dates.len(), self.symbols.len())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Cell at row `t`, column `i`. Panics if out of bounds, like slice indexing.
    pub fn get(&self, t: usize, i: usize) -> T {
        assert!(i < self.symbols.len(), "column {i} out of bounds");
        self.values[t * self.symbols.len() + i]
    }

    pub fn row(&self, t: usize) -> &[T] {
        let n = self.symbols.len();
        &self.values[t * n..(t + 1) * n]
    }

    pub fn column(&self, i: usize) -> Vec<T> {
        (0..self.dates.len()).map(|t| self.get(t, i)).collect()
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Value at `(date, symbol)`, or `None` if either label is absent.
    pub fn lookup(&self, date: NaiveDate, symbol: &str) -> Option<T> {
        let t = self.date_index(date)?;
        let i = self.symbol_index(symbol)?;
        Some(self.get(t, i))
    }

    /// True when both panels have identical dates and symbols, in order.
    pub fn same_index<U>(&self, other: &Panel<U>) -> bool {
        self.dates == other.dates && self.symbols == other.symbols
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Panel<U> {
        Panel {
            dates: self.dates.clone(),
            symbols: self.symbols.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    pub(crate) fn row_mut(&mut self, t: usize) -> &mut [T] {
        let n = self.symbols.len();
        &mut self.values[t * n..(t + 1) * n]
    }

    /// Overwrite column `i`; `column.len()` must equal the number of dates.
    pub(crate) fn set_column(&mut self, i: usize, column: &[T]) {
        let n = self.symbols.len();
        for (t, &v) in column.iter().enumerate().take(self.dates.len()) {
            self.values[t * n + i] = v;
        }
    }
}

/// Reject unsorted or duplicated dates and duplicated symbols.
fn validate_index(dates: &[NaiveDate], symbols: &[Symbol]) -> Result<(), BacktestError> {
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(BacktestError::InvalidIndex(format!(
            "dates must be strictly increasing, found {} then {}",
            pair[0], pair[1]
        )));
    }

    let mut seen = HashSet::with_capacity(symbols.len());
    for symbol in symbols {
        if !seen.insert(symbol.as_str()) {
            return Err(BacktestError::InvalidIndex(format!(
                "duplicate instrument '{symbol}'"
            )));
        }
    }
    Ok(())
}

/// Consecutive calendar days starting at `start`, handy for tests and demos.
pub fn daily_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}
