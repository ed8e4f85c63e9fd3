//! Period-over-period delta computation
//!
//! Pointwise subtraction over an aligned pair for one chosen metric:
//! percentage-point differences for rates, signed count differences for
//! volumes. Values are stored exact; rounding happens only at presentation.

use crate::error::{Error, Result};
use crate::models::{AlignedPair, DeltaRow, DeltaSplit};

/// Compute row-aligned deltas for one metric
///
/// `diff_pp = rate_year2 - rate_year1`: positive means the churn rate went
/// up year-over-year. The metric must be present on every aligned row.
pub fn compute_deltas(pair: &AlignedPair, metric: &str) -> Result<Vec<DeltaRow>> {
    let mut deltas = Vec::with_capacity(pair.len());

    for (a, b) in pair.rows_year1.iter().zip(&pair.rows_year2) {
        let rate_year1 = a.rate(metric).ok_or_else(|| missing_metric(metric))?;
        let rate_year2 = b.rate(metric).ok_or_else(|| missing_metric(metric))?;

        deltas.push(DeltaRow {
            period: b.period,
            rate_year1,
            rate_year2,
            diff_pp: rate_year2 - rate_year1,
            volume_year1: a.volume,
            volume_year2: b.volume,
            diff_count: b.volume - a.volume,
        });
    }

    Ok(deltas)
}

fn missing_metric(metric: &str) -> Error {
    Error::DataShape {
        worksheet: String::from("정렬된 데이터"),
        missing: vec![metric.to_string()],
    }
}

/// Partition delta rows by sign, preserving relative order
///
/// Non-negative rows mark periods where the rate rose (worse for churn);
/// negative rows mark improvements. Presentation renders the two groups
/// with different markers.
pub fn split_by_sign(deltas: &[DeltaRow]) -> DeltaSplit {
    let mut split = DeltaSplit::default();

    for delta in deltas {
        if delta.diff_pp >= 0.0 {
            split.non_negative.push(delta.clone());
        } else {
            split.negative.push(delta.clone());
        }
    }

    split
}
