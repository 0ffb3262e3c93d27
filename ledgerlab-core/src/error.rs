//! Fatal backtest errors.
//!
//! Everything here aborts a run. Missing prices, insufficient cash and sells
//! against an empty position are normal market conditions and never show up
//! as an error; they are visible only in the ledger's trade deltas.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Symbol;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("empty universe: no instrument has at least {min_history} observations")]
    EmptyUniverse { min_history: usize },

    #[error(
        "insufficient history for '{symbol}': {observations} observations, need at least {min_history}"
    )]
    InsufficientHistory {
        symbol: Symbol,
        observations: usize,
        min_history: usize,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid price {price} for '{symbol}' on {date}")]
    InvalidPrice {
        date: NaiveDate,
        symbol: Symbol,
        price: f64,
    },

    #[error("invalid panel index: {0}")]
    InvalidIndex(String),

    #[error("invalid execution config: {0}")]
    InvalidConfig(String),
}
