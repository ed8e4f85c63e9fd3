//! Trailing confidence-window annotation
//!
//! Churn is a lagging measure: a funnel stage that takes months to mature
//! shows artificially low rates for recent periods. The curated map in
//! `true_range.json` records, per metric, how many trailing periods are too
//! young to trust; this module turns that number into a concrete period
//! window for the presentation layer to shade.

use std::collections::BTreeMap;

use crate::models::{AlignedPair, ConfidenceWindow, MetricRow};

/// Compute the flagged trailing window for a metric, if any
///
/// The window derives from the current-year series (falling back to the
/// reference year when the current year is empty): `cutoff = max_period -
/// |n| + 1`, clamped to the observed minimum period. A metric absent from
/// the map, a zero entry, or an empty pair all mean "fully reliable".
pub fn confidence_window(
    metric: &str,
    ranges: &BTreeMap<String, i32>,
    pair: &AlignedPair,
) -> Option<ConfidenceWindow> {
    let periods = ranges.get(metric)?.unsigned_abs();
    if periods == 0 {
        return None;
    }

    let side: &[MetricRow] = if pair.rows_year2.is_empty() {
        &pair.rows_year1
    } else {
        &pair.rows_year2
    };

    let max_period = side.iter().map(|r| r.period).max()?;
    let min_period = side.iter().map(|r| r.period).min()?;

    let cutoff = max_period as i64 - periods as i64 + 1;
    if cutoff > max_period as i64 {
        return None;
    }

    let start = cutoff.max(min_period as i64) as u32;

    Some(ConfidenceWindow {
        start,
        end: max_period,
        periods,
    })
}
