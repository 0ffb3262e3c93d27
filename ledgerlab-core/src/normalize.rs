//! Signal normalizer: raw strategy output → executable signal panel.
//!
//! This is the only place the "decide today, act tomorrow" lag is applied.
//! The engine always receives already-lagged signals and never shifts them.

use std::collections::HashMap;

use crate::error::BacktestError;
use crate::panel::{Panel, PricePanel, RawSignalPanel, SignalPanel};

/// Reindex, clamp and (optionally) lag a raw signal panel onto `prices`.
///
/// - Cells absent from `raw` (unknown date or symbol) and `NaN` scores become 0.
/// - Scores are clipped to [-1, 1] and truncated toward zero, so continuous
///   scores are tolerated: `0.7 → 0`, `-3.0 → -1`.
/// - With `lag`, row `t` takes row `t - 1`'s value and row 0 is all zeros.
///
/// Fails with `ShapeMismatch` when `raw` shares no instrument with `prices`.
pub fn normalize(
    raw: &RawSignalPanel,
    prices: &PricePanel,
    lag: bool,
) -> Result<SignalPanel, BacktestError> {
    let reindexed = reindex_signals(raw, prices)?;
    if !lag {
        return Ok(reindexed);
    }
    Ok(shift_forward(&reindexed))
}

/// Reindex and clamp without lagging: the raw-signal audit trail.
pub fn reindex_signals(
    raw: &RawSignalPanel,
    prices: &PricePanel,
) -> Result<SignalPanel, BacktestError> {
    let raw_cols: HashMap<&str, usize> = raw
        .symbols()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    // Column j of the price panel reads column `col_map[j]` of the raw panel.
    let col_map: Vec<Option<usize>> = prices
        .symbols()
        .iter()
        .map(|s| raw_cols.get(s.as_str()).copied())
        .collect();

    if col_map.iter().all(Option::is_none) {
        return Err(BacktestError::ShapeMismatch(format!(
            "signal panel instruments {:?} do not overlap price panel instruments {:?}",
            raw.symbols(),
            prices.symbols()
        )));
    }

    let mut out: SignalPanel = Panel::like(prices.panel(), 0);
    for (t, date) in prices.dates().iter().enumerate() {
        let Some(raw_t) = raw.date_index(*date) else {
            continue;
        };
        let raw_row = raw.row(raw_t);
        let row = out.row_mut(t);
        for (cell, src) in row.iter_mut().zip(&col_map) {
            if let Some(i) = src {
                *cell = clamp_score(raw_row[*i]);
            }
        }
    }
    Ok(out)
}

/// Clip a score to [-1, 1] and truncate toward zero; `NaN` is a hold.
pub fn clamp_score(score: f64) -> i8 {
    if score.is_nan() {
        return 0;
    }
    score.clamp(-1.0, 1.0).trunc() as i8
}

/// Shift every column down one row, filling row 0 with holds.
fn shift_forward(signals: &SignalPanel) -> SignalPanel {
    let mut out = Panel::like(signals, 0);
    for t in 1..signals.n_dates() {
        out.row_mut(t).copy_from_slice(signals.row(t - 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::daily_dates;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn prices() -> PricePanel {
        PricePanel::from_columns(
            daily_dates(start(), 3),
            vec![
                ("AAA".into(), vec![10.0, 11.0, 12.0]),
                ("BBB".into(), vec![20.0, 21.0, 22.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn clamp_score_truncates_continuous_values() {
        assert_eq!(clamp_score(0.7), 0);
        assert_eq!(clamp_score(-0.7), 0);
        assert_eq!(clamp_score(1.0), 1);
        assert_eq!(clamp_score(3.2), 1);
        assert_eq!(clamp_score(-42.0), -1);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(f64::INFINITY), 1);
    }

    #[test]
    fn lag_shifts_rows_down() {
        let raw = Panel::from_columns(
            daily_dates(start(), 3),
            vec![
                ("AAA".into(), vec![1.0, 0.0, -1.0]),
                ("BBB".into(), vec![-1.0, 1.0, 1.0]),
            ],
        )
        .unwrap();

        let exec = normalize(&raw, &prices(), true).unwrap();
        assert_eq!(exec.column(0), vec![0, 1, 0]);
        assert_eq!(exec.column(1), vec![0, -1, 1]);

        let unlagged = normalize(&raw, &prices(), false).unwrap();
        assert_eq!(unlagged.column(0), vec![1, 0, -1]);
    }

    #[test]
    fn missing_cells_become_holds() {
        // Raw panel only knows AAA, and only the second date, plus an unknown symbol.
        let raw = Panel::from_columns(
            vec![start() + chrono::Duration::days(1)],
            vec![("AAA".into(), vec![5.0]), ("ZZZ".into(), vec![1.0])],
        )
        .unwrap();

        let exec = normalize(&raw, &prices(), false).unwrap();
        assert!(exec.same_index(prices().panel()));
        assert_eq!(exec.column(0), vec![0, 1, 0]);
        assert_eq!(exec.column(1), vec![0, 0, 0]);
    }

    #[test]
    fn zero_overlap_is_a_shape_mismatch() {
        let raw = Panel::from_columns(
            daily_dates(start(), 3),
            vec![("ZZZ".into(), vec![1.0, 1.0, 1.0])],
        )
        .unwrap();
        let err = normalize(&raw, &prices(), true).unwrap_err();
        assert!(matches!(err, BacktestError::ShapeMismatch(_)));
    }

    #[test]
    fn single_row_lag_is_all_holds() {
        let prices = PricePanel::from_columns(
            vec![start()],
            vec![("AAA".into(), vec![10.0])],
        )
        .unwrap();
        let raw = Panel::from_columns(vec![start()], vec![("AAA".into(), vec![1.0])]).unwrap();
        let exec = normalize(&raw, &prices, true).unwrap();
        assert_eq!(exec.values(), &[0]);
    }
}
