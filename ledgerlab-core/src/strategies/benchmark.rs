//! Baselines: buy-and-hold and do-nothing.

use serde::{Deserialize, Serialize};

use super::SignalSource;
use crate::panel::{Panel, PricePanel, RawSignalPanel};

/// Emit +1 for every instrument at row `buy_index`, 0 elsewhere.
///
/// Under the default lag the buy executes one day later. A `buy_index`
/// outside the panel produces no signal at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyOnce {
    pub buy_index: usize,
}

impl SignalSource for BuyOnce {
    fn name(&self) -> &str {
        "buy_once"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        let mut out: RawSignalPanel = Panel::like(prices.panel(), 0.0);
        if self.buy_index < prices.n_dates() {
            out.row_mut(self.buy_index).fill(1.0);
        }
        out
    }
}

/// All zeros. Useful as a control: the ledger must stay at initial cash.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NullSignal;

impl SignalSource for NullSignal {
    fn name(&self) -> &str {
        "null_signal"
    }

    fn compute_signals(&self, prices: &PricePanel) -> RawSignalPanel {
        Panel::like(prices.panel(), 0.0)
    }
}
