//! Artifact export: ledger table, fill blotter and run summary per strategy.
//!
//! Layout under the output directory:
//! ```text
//! <out>/session.json
//! <out>/<label>/ledger.csv
//! <out>/<label>/fills.csv
//! <out>/<label>/summary.json
//! ```

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use ledgerlab_core::domain::{DatasetHash, Fill, LedgerHash};
use ledgerlab_core::{ExecutionConfig, Ledger};

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;
use crate::runner::{RunFailure, RunOutcome, StrategyRun};

/// Current schema version for persisted summaries.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-strategy summary written as `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub schema_version: u32,
    pub run_id: &'a str,
    pub label: &'a str,
    pub strategy: &'a str,
    pub dataset_hash: &'a DatasetHash,
    pub fingerprint: &'a LedgerHash,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub instruments: usize,
    pub execution: &'a ExecutionConfig,
    pub metrics: &'a PerformanceMetrics,
}

#[derive(Debug, Serialize)]
struct SessionSummary<'a> {
    schema_version: u32,
    run_id: &'a RunId,
    dataset_hash: &'a DatasetHash,
    runs: Vec<SessionEntry<'a>>,
    failures: &'a [RunFailure],
}

#[derive(Debug, Serialize)]
struct SessionEntry<'a> {
    label: &'a str,
    fingerprint: &'a LedgerHash,
    metrics: &'a PerformanceMetrics,
}

/// Write every artifact for a session; returns the files written.
pub fn export_outcome(outcome: &RunOutcome, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    create_dir(out_dir)?;
    let mut written = Vec::new();

    for run in &outcome.runs {
        written.extend(export_run(run, &outcome.run_id, &outcome.dataset_hash, out_dir)?);
    }

    let session = SessionSummary {
        schema_version: SCHEMA_VERSION,
        run_id: &outcome.run_id,
        dataset_hash: &outcome.dataset_hash,
        runs: outcome
            .runs
            .iter()
            .map(|r| SessionEntry {
                label: &r.label,
                fingerprint: &r.fingerprint,
                metrics: &r.metrics,
            })
            .collect(),
        failures: &outcome.failures,
    };
    let path = out_dir.join("session.json");
    write_file(&path, serde_json::to_string_pretty(&session)?.as_bytes())?;
    written.push(path);

    info!(dir = %out_dir.display(), files = written.len(), "artifacts written");
    Ok(written)
}

fn export_run(
    run: &StrategyRun,
    run_id: &str,
    dataset_hash: &DatasetHash,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let dir = out_dir.join(&run.label);
    create_dir(&dir)?;

    let ledger_path = dir.join("ledger.csv");
    write_file(&ledger_path, &ledger_csv(&run.ledger)?)?;

    let fills_path = dir.join("fills.csv");
    write_file(&fills_path, &fills_csv(run.ledger.fills())?)?;

    let dates = run.ledger.dates();
    let summary = RunSummary {
        schema_version: SCHEMA_VERSION,
        run_id,
        label: &run.label,
        strategy: run.ledger.strategy(),
        dataset_hash,
        fingerprint: &run.fingerprint,
        start_date: dates.first().map(|d| d.to_string()),
        end_date: dates.last().map(|d| d.to_string()),
        instruments: run.ledger.symbols().len(),
        execution: run.ledger.config(),
        metrics: &run.metrics,
    };
    let summary_path = dir.join("summary.json");
    write_file(&summary_path, serde_json::to_string_pretty(&summary)?.as_bytes())?;

    Ok(vec![ledger_path, fills_path, summary_path])
}

/// Wide ledger table: one row per date.
///
/// Columns: `Date`, then per instrument `<SYM>_Price`, `<SYM>_RawSignal`,
/// `<SYM>_ExecSignal`, `<SYM>_Trades`, `<SYM>_Holdings`, then `Cash` and
/// `TotalAssets`. A missing price is an empty cell.
pub fn ledger_csv(ledger: &Ledger) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    for symbol in ledger.symbols() {
        for field in ["Price", "RawSignal", "ExecSignal", "Trades", "Holdings"] {
            header.push(format!("{symbol}_{field}"));
        }
    }
    header.push("Cash".into());
    header.push("TotalAssets".into());
    wtr.write_record(&header)?;

    for t in 0..ledger.len() {
        let Some(row) = ledger.row_at(t) else {
            continue;
        };
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.to_string());
        for i in 0..row.symbols.len() {
            let price = row.prices[i];
            record.push(if price.is_nan() {
                String::new()
            } else {
                price.to_string()
            });
            record.push(row.raw_signals[i].to_string());
            record.push(row.executed_signals[i].to_string());
            record.push(row.trades[i].to_string());
            record.push(row.holdings[i].to_string());
        }
        record.push(format!("{:.4}", row.cash));
        record.push(format!("{:.4}", row.total_assets));
        wtr.write_record(&record)?;
    }

    into_bytes(wtr)
}

/// Fill blotter: one row per executed order, in execution order.
pub fn fills_csv(fills: &[Fill]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for fill in fills {
        wtr.serialize(fill)?;
    }
    if fills.is_empty() {
        wtr.write_record(["date", "symbol", "side", "quantity", "price", "cash_after"])?;
    }
    into_bytes(wtr)
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    wtr.into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
