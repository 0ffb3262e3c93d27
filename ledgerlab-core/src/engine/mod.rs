//! Backtesting engine: daily execution loop and supporting state.
//!
//! The engine consumes a price panel and an already-normalized signal panel
//! on the same index, then folds over dates:
//!
//! 1. Desire vector from the executed signals (no-short floor)
//! 2. Sell pass, settling proceeds into cash
//! 3. Buy pass under the configured admission policy
//! 4. Snapshot of trades, holdings and cash

pub mod admission;
pub mod config;
pub mod loop_runner;
pub mod state;

pub use admission::{admit_buys, Admission};
pub use config::{BuyAdmission, ExecutionConfig, SellPolicy};
pub use loop_runner::{desire_vector, execute, run_backtest, Execution};
pub use state::{position_value, Book};
