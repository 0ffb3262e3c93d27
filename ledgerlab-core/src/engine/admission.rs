//! Buy admission control.
//!
//! Sells are settled before this runs, so `book.cash()` already includes the
//! day's proceeds. Candidates are visited in `priority` order (sorted
//! instrument identifiers) and cash is reserved one instrument at a time,
//! which is what makes cash exhaustion deterministic.

use super::config::BuyAdmission;
use super::state::Book;

/// What happened to one instrument's buy desire on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Filled {
        i: usize,
        quantity: i64,
        price: f64,
        /// Cash left after this lot was paid for.
        cash_after: f64,
    },
    /// Cash could not cover the lot.
    InsufficientCash { i: usize, price: f64 },
    /// No price today; the desire is dropped, not deferred.
    MissingPrice { i: usize },
    /// A zero price cannot be sized by cash weighting.
    Unsizable { i: usize },
}

/// Run the buy pass for one day.
///
/// `desire[i] > 0` is the lot size the desire vector asked for; under
/// `EqualCashWeighted` it only marks the instrument as a candidate.
pub fn admit_buys(
    book: &mut Book,
    desire: &[i64],
    prices: &[f64],
    priority: &[usize],
    policy: BuyAdmission,
) -> Vec<Admission> {
    let candidates: Vec<usize> = priority.iter().copied().filter(|&i| desire[i] > 0).collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    match policy {
        BuyAdmission::SortedPriority => candidates
            .into_iter()
            .map(|i| {
                let price = prices[i];
                if price.is_nan() {
                    Admission::MissingPrice { i }
                } else if book.try_buy(i, desire[i], price) {
                    Admission::Filled {
                        i,
                        quantity: desire[i],
                        price,
                        cash_after: book.cash(),
                    }
                } else {
                    Admission::InsufficientCash { i, price }
                }
            })
            .collect(),
        BuyAdmission::EqualCashWeighted => {
            let sizable = candidates
                .iter()
                .filter(|&&i| !prices[i].is_nan() && prices[i] > 0.0)
                .count();
            let budget = if sizable > 0 {
                book.cash() / sizable as f64
            } else {
                0.0
            };

            candidates
                .into_iter()
                .map(|i| {
                    let price = prices[i];
                    if price.is_nan() {
                        return Admission::MissingPrice { i };
                    }
                    if price <= 0.0 {
                        return Admission::Unsizable { i };
                    }
                    let quantity = (budget / price).floor() as i64;
                    if book.try_buy(i, quantity, price) {
                        Admission::Filled {
                            i,
                            quantity,
                            price,
                            cash_after: book.cash(),
                        }
                    } else {
                        Admission::InsufficientCash { i, price }
                    }
                })
                .collect()
        }
    }
}
