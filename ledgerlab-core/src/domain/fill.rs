use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Symbol;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One executed market order.
///
/// `cash_after` is the shared cash balance immediately after this fill, so
/// the blotter can be replayed in order to audit intra-day admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub date: NaiveDate,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub cash_after: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }

    /// Share delta this fill applies to the position.
    pub fn signed_quantity(&self) -> i64 {
        match self.side {
            Side::Buy => self.quantity,
            Side::Sell => -self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_quantity_follows_side() {
        let mut fill = Fill {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            symbol: "SPY".into(),
            side: Side::Buy,
            quantity: 3,
            price: 10.0,
            cash_after: 70.0,
        };
        assert_eq!(fill.signed_quantity(), 3);
        assert_eq!(fill.notional(), 30.0);

        fill.side = Side::Sell;
        assert_eq!(fill.signed_quantity(), -3);
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
        assert_eq!(Side::Buy.to_string(), "buy");
    }
}
