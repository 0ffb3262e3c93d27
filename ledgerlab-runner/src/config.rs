//! Serializable backtest configuration.
//!
//! One TOML file describes a whole session: how to execute, where the prices
//! live and how to align them, and which strategies to run over them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use ledgerlab_core::strategies::{BuyOnce, Macd, MaCrossover, RsiThreshold, VolatilityBreakout};
use ledgerlab_core::{AlignOptions, AlignPolicy, BacktestError, ExecutionConfig, StrategySpec};

/// Unique identifier for a backtest session (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to encode config for hashing: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete, reproducible description of a backtest session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
}

/// Where prices come from and how instruments are admitted to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of `<SYMBOL>.csv` files with `Date` and `Close` columns.
    pub dir: PathBuf,
    pub min_history: usize,
    pub required: BTreeSet<String>,
    pub align: AlignPolicy,
    /// Optional subset; empty means every file in `dir`.
    pub symbols: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("sp500_adj_close"),
            min_history: 2500,
            required: BTreeSet::new(),
            align: AlignPolicy::TrailingWindow,
            symbols: Vec::new(),
        }
    }
}

impl DataConfig {
    pub fn align_options(&self) -> AlignOptions {
        AlignOptions {
            min_history: self.min_history,
            required: self.required.clone(),
            policy: self.align,
        }
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The configuration `init` writes: default execution and data settings
    /// with every reference strategy at its default parameters.
    pub fn default_config() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            data: DataConfig::default(),
            strategies: vec![
                StrategySpec::MaCrossover(MaCrossover::default()),
                StrategySpec::Macd(Macd::default()),
                StrategySpec::RsiThreshold(RsiThreshold::default()),
                StrategySpec::VolatilityBreakout(VolatilityBreakout::default()),
                StrategySpec::BuyOnce(BuyOnce::default()),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.execution.validate().map_err(invalid)?;
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[strategies]] entry is required".into(),
            ));
        }
        for spec in &self.strategies {
            spec.validate().map_err(invalid)?;
        }
        if let Some(missing) = self
            .data
            .required
            .iter()
            .find(|r| !self.data.symbols.is_empty() && !self.data.symbols.contains(*r))
        {
            return Err(ConfigError::Invalid(format!(
                "required instrument '{missing}' is not in data.symbols"
            )));
        }
        Ok(())
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two sessions with identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn invalid(err: BacktestError) -> ConfigError {
    match err {
        BacktestError::InvalidConfig(msg) => ConfigError::Invalid(msg),
        other => ConfigError::Invalid(other.to_string()),
    }
}
