//! Period alignment between two comparison years
//!
//! Restricts both years to the overlapping period range so the series can be
//! compared pair-by-pair. Pairing is by equal period number, not by array
//! position: when one year is missing a week the other has, the unmatched
//! row drops out instead of silently shifting every later pair. When the two
//! years share no periods at all, both partitions pass through the filter
//! unchanged and are truncated to the shorter length, which is a defined
//! fallback rather than an error.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AlignedPair, MetricRow, MetricTable};

/// Align two years of a dataset onto their comparable window
pub fn align_years(table: &MetricTable, year1: i32, year2: i32) -> AlignedPair {
    let mut rows_year1: Vec<MetricRow> = table
        .rows
        .iter()
        .filter(|r| r.year == year1)
        .cloned()
        .collect();
    let mut rows_year2: Vec<MetricRow> = table
        .rows
        .iter()
        .filter(|r| r.year == year2)
        .cloned()
        .collect();

    rows_year1.sort_by_key(|r| r.period);
    rows_year2.sort_by_key(|r| r.period);

    let periods1: BTreeSet<u32> = rows_year1.iter().map(|r| r.period).collect();
    let periods2: BTreeSet<u32> = rows_year2.iter().map(|r| r.period).collect();
    let common: BTreeSet<u32> = periods1.intersection(&periods2).copied().collect();

    if let Some(&max_common) = common.iter().next_back() {
        rows_year1.retain(|r| r.period <= max_common);
        rows_year2.retain(|r| r.period <= max_common);

        // Pair by equal period number; rows without a counterpart drop out
        let by_period1: BTreeMap<u32, MetricRow> =
            rows_year1.into_iter().map(|r| (r.period, r)).collect();
        let by_period2: BTreeMap<u32, MetricRow> =
            rows_year2.into_iter().map(|r| (r.period, r)).collect();

        let mut paired1 = Vec::with_capacity(common.len());
        let mut paired2 = Vec::with_capacity(common.len());
        for period in &common {
            paired1.push(by_period1[period].clone());
            paired2.push(by_period2[period].clone());
        }

        AlignedPair {
            year1,
            year2,
            rows_year1: paired1,
            rows_year2: paired2,
        }
    } else {
        // No shared periods: pass both through unfiltered, matched on length
        let len = rows_year1.len().min(rows_year2.len());
        rows_year1.truncate(len);
        rows_year2.truncate(len);

        tracing::debug!(year1, year2, "공통 기간 없음, 필터 없이 정렬");

        AlignedPair {
            year1,
            year2,
            rows_year1,
            rows_year2,
        }
    }
}
