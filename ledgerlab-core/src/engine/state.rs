//! The engine's two registers: shared cash and per-instrument holdings.

/// Mutable state folded across dates. Owned by exactly one run.
///
/// Invariants maintained by every method: `cash >= 0` and every holding
/// `>= 0`. A buy that would break the cash invariant is refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    cash: f64,
    holdings: Vec<i64>,
}

impl Book {
    pub fn new(initial_cash: f64, n_instruments: usize) -> Self {
        Self {
            cash: initial_cash,
            holdings: vec![0; n_instruments],
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> &[i64] {
        &self.holdings
    }

    pub fn holding(&self, i: usize) -> i64 {
        self.holdings[i]
    }

    /// Sell up to `quantity` shares of `i`; returns the shares actually sold.
    pub fn sell(&mut self, i: usize, quantity: i64, price: f64) -> i64 {
        let qty = quantity.min(self.holdings[i]).max(0);
        self.holdings[i] -= qty;
        self.cash += qty as f64 * price;
        qty
    }

    /// Buy exactly `quantity` shares of `i` if cash covers the whole lot.
    pub fn try_buy(&mut self, i: usize, quantity: i64, price: f64) -> bool {
        if quantity <= 0 {
            return false;
        }
        let cost = quantity as f64 * price;
        if cost > self.cash {
            return false;
        }
        self.cash -= cost;
        self.holdings[i] += quantity;
        true
    }

    /// Cash plus holdings valued at `prices`; a missing price contributes zero.
    pub fn mark_to_market(&self, prices: &[f64]) -> f64 {
        self.cash + position_value(&self.holdings, prices)
    }
}

/// Σ holdings × price, skipping missing prices.
pub fn position_value(holdings: &[i64], prices: &[f64]) -> f64 {
    holdings
        .iter()
        .zip(prices)
        .filter(|(_, p)| !p.is_nan())
        .map(|(&h, &p)| h as f64 * p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_then_sell() {
        let mut book = Book::new(100.0, 2);
        assert!(book.try_buy(0, 1, 10.0));
        assert_eq!(book.cash(), 90.0);
        assert_eq!(book.holding(0), 1);

        assert_eq!(book.sell(0, 1, 12.0), 1);
        assert_eq!(book.cash(), 102.0);
        assert_eq!(book.holding(0), 0);
    }

    #[test]
    fn buy_refused_when_cash_short() {
        let mut book = Book::new(5.0, 1);
        assert!(!book.try_buy(0, 1, 10.0));
        assert_eq!(book.cash(), 5.0);
        assert_eq!(book.holding(0), 0);
    }

    #[test]
    fn buy_exact_cash_is_allowed() {
        let mut book = Book::new(10.0, 1);
        assert!(book.try_buy(0, 1, 10.0));
        assert_eq!(book.cash(), 0.0);
    }

    #[test]
    fn sell_never_goes_short() {
        let mut book = Book::new(0.0, 1);
        assert_eq!(book.sell(0, 3, 10.0), 0);
        assert_eq!(book.holding(0), 0);
        assert_eq!(book.cash(), 0.0);
    }

    #[test]
    fn mark_to_market_skips_missing_prices() {
        let mut book = Book::new(100.0, 2);
        book.try_buy(0, 2, 10.0);
        book.try_buy(1, 1, 20.0);
        assert_eq!(book.mark_to_market(&[11.0, f64::NAN]), 60.0 + 22.0);
        assert_eq!(book.mark_to_market(&[11.0, 20.0]), 60.0 + 22.0 + 20.0);
    }
}
