//! Execution parameters for a single backtest run.

use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Which desired buys get funded when cash cannot cover all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyAdmission {
    /// Buy `max_buy_per_tick` shares per signal, first-come-first-funded in
    /// increasing instrument-identifier order. The reference policy.
    #[default]
    SortedPriority,
    /// Split the day's cash equally across buy signals and buy as many whole
    /// shares as each slice affords.
    EqualCashWeighted,
}

/// How many shares a sell signal releases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellPolicy {
    /// Up to `max_sell_per_tick` shares.
    #[default]
    PerTick,
    /// The whole position.
    Liquidate,
}

/// Configuration shared by every strategy in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub initial_cash: f64,
    /// Apply the one-day lag: act on yesterday's signal.
    pub act_on_previous_signal: bool,
    pub max_buy_per_tick: u32,
    pub max_sell_per_tick: u32,
    pub buy_admission: BuyAdmission,
    pub sell_policy: SellPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            act_on_previous_signal: true,
            max_buy_per_tick: 1,
            max_sell_per_tick: 1,
            buy_admission: BuyAdmission::SortedPriority,
            sell_policy: SellPolicy::PerTick,
        }
    }
}

impl ExecutionConfig {
    /// Reference policy with a custom starting balance.
    pub fn with_cash(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(BacktestError::InvalidConfig(format!(
                "initial_cash must be a positive finite amount, got {}",
                self.initial_cash
            )));
        }
        Ok(())
    }
}
