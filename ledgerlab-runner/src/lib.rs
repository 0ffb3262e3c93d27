//! LedgerLab Runner: backtest orchestration, metrics and artifacts.
//!
//! This crate builds on `ledgerlab-core` to provide:
//! - TOML session configuration with a deterministic run id
//! - Price loading from a directory of per-instrument CSV files
//! - Seeded synthetic price universes for offline runs
//! - Parallel multi-strategy runs over one aligned panel
//! - Performance metrics and CSV/JSON artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigError, DataConfig, RunId};
pub use data_loader::{load_price_dir, load_price_file, load_prices, LoadError};
pub use export::{export_outcome, ExportError};
pub use metrics::PerformanceMetrics;
pub use runner::{run_on_prices, run_session, RunError, RunFailure, RunOutcome, StrategyRun};
pub use synthetic::{synthetic_universe, SyntheticOptions};
