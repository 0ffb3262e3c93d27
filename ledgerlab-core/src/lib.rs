//! LedgerLab Core: panels, signal normalization, execution engine, ledger.
//!
//! This crate contains the heart of the daily backtester:
//! - Domain types (symbols, signals, fills, ledger hashes)
//! - Price and signal panels with validated date/instrument indices
//! - Price alignment (trailing-window and date-union policies)
//! - Signal normalizer: reindex, clamp to {-1, 0, 1}, previous-day lag
//! - Execution engine: sells-before-buys daily fold over `(cash, holdings)`
//! - Ledger assembly, invariant checks, and fingerprints
//! - Reference indicators and strategies behind the `SignalSource` trait

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod ledger;
pub mod normalize;
pub mod panel;
pub mod strategies;

pub use engine::{execute, run_backtest, BuyAdmission, Execution, ExecutionConfig, SellPolicy};
pub use error::BacktestError;
pub use ledger::{assemble, InstrumentTrail, InvariantViolation, Ledger, LedgerRow};
pub use normalize::{normalize, reindex_signals};
pub use panel::{align_prices, AlignOptions, AlignPolicy, Panel, PricePanel, PriceSeries};
pub use panel::{RawSignalPanel, SignalPanel};
pub use strategies::{SignalSource, StrategySpec};
