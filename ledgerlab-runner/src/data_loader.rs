//! Price loading from a directory of per-instrument CSV files.
//!
//! Each `<SYMBOL>.csv` holds a `Date` column (`YYYY-MM-DD`, optionally with a
//! time suffix) and a `Close` column. Rows with an empty or NaN close are
//! dropped; the symbol is the file stem. Loaded series are then
//! aligned into one `PricePanel` by the core.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use ledgerlab_core::domain::Symbol;
use ledgerlab_core::{align_prices, BacktestError, PricePanel, PriceSeries};

use crate::config::DataConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse CSV '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("'{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("'{path}' line {line}: bad date '{value}'")]
    BadDate {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("'{path}' line {line}: bad close '{value}'")]
    BadPrice {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("no price files found in '{0}'")]
    NoFiles(PathBuf),

    #[error("no price file for requested symbol '{0}'")]
    UnknownSymbol(String),

    #[error("alignment failed: {0}")]
    Align(#[from] BacktestError),
}

/// Load, then align, the prices a `DataConfig` describes.
pub fn load_prices(data: &DataConfig) -> Result<PricePanel, LoadError> {
    let series = load_price_dir(&data.dir, &data.symbols)?;
    let panel = align_prices(&series, &data.align_options())?;
    info!(
        dir = %data.dir.display(),
        loaded = series.len(),
        aligned = panel.n_symbols(),
        dates = panel.n_dates(),
        "prices loaded"
    );
    Ok(panel)
}

/// Load every `*.csv` in `dir`, or only `symbols` when that is non-empty.
pub fn load_price_dir(
    dir: &Path,
    symbols: &[Symbol],
) -> Result<BTreeMap<Symbol, PriceSeries>, LoadError> {
    let mut out = BTreeMap::new();

    if symbols.is_empty() {
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| LoadError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(symbol) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            out.insert(symbol.to_string(), load_price_file(&path)?);
        }
    } else {
        for symbol in symbols {
            let path = dir.join(format!("{symbol}.csv"));
            if !path.is_file() {
                return Err(LoadError::UnknownSymbol(symbol.clone()));
            }
            out.insert(symbol.clone(), load_price_file(&path)?);
        }
    }

    if out.is_empty() {
        return Err(LoadError::NoFiles(dir.to_path_buf()));
    }
    Ok(out)
}

/// Parse one `Date,Close` CSV file into a price series.
pub fn load_price_file(path: &Path) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| csv_error(path, source))?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    let date_col = column_index(&headers, "Date", path)?;
    let close_col = column_index(&headers, "Close", path)?;

    let mut pairs = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(path, source))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_close = record.get(close_col).unwrap_or("").trim();
        if raw_close.is_empty() {
            dropped += 1;
            continue;
        }
        let close: f64 = raw_close.parse().map_err(|_| LoadError::BadPrice {
            path: path.to_path_buf(),
            line,
            value: raw_close.to_string(),
        })?;
        if close.is_nan() {
            dropped += 1;
            continue;
        }

        let raw_date = record.get(date_col).unwrap_or("").trim();
        let date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            path: path.to_path_buf(),
            line,
            value: raw_date.to_string(),
        })?;
        pairs.push((date, close));
    }

    if dropped > 0 {
        warn!(path = %path.display(), dropped, "skipped rows without a close");
    }
    debug!(path = %path.display(), rows = pairs.len(), "price file parsed");
    Ok(PriceSeries::from_pairs(pairs))
}

/// `YYYY-MM-DD`, ignoring anything after the first ten characters.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn column_index(
    headers: &csv::StringRecord,
    column: &'static str,
    path: &Path,
) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
