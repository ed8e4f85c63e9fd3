//! Analytics core: period extraction, alignment, deltas, confidence windows
//!
//! The whole core is synchronous and pure with respect to its inputs; every
//! user interaction recomputes extract → align → delta → confidence from the
//! latest dataset snapshot.

pub mod align;
pub mod confidence;
pub mod delta;
pub mod extract;

pub use align::align_years;
pub use confidence::confidence_window;
pub use delta::{compute_deltas, split_by_sign};
pub use extract::{extract_rows, parse_date, parse_percent, parse_volume};

use serde::{Deserialize, Serialize};

use crate::config::ConfidenceConfig;
use crate::error::Result;
use crate::models::{AlignedPair, ConfidenceWindow, DeltaRow, DeltaSplit, Granularity, MetricTable};

/// One user selection: which metric and which year pair to compare
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    /// Funnel-stage column to compare
    pub metric: String,

    /// Reference (earlier) year
    pub year1: i32,

    /// Current (later) year
    pub year2: i32,
}

/// Everything the presentation layer needs for one comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub metric: String,
    pub granularity: Granularity,

    /// Aligned year pair
    pub pair: AlignedPair,

    /// Row-aligned deltas, same length as the pair
    pub deltas: Vec<DeltaRow>,

    /// Sign partition of the deltas
    pub split: DeltaSplit,

    /// Mean rate per side over the aligned window
    pub mean_year1: Option<f64>,
    pub mean_year2: Option<f64>,

    /// Trailing low-confidence window, if the metric has one
    pub confidence: Option<ConfidenceWindow>,
}

/// Run the full comparison pipeline over an extracted dataset
pub fn compare(
    table: &MetricTable,
    input: &ComparisonInput,
    confidence_config: &ConfidenceConfig,
) -> Result<Comparison> {
    let pair = align_years(table, input.year1, input.year2);
    let deltas = compute_deltas(&pair, &input.metric)?;
    let split = split_by_sign(&deltas);
    let ranges = confidence_config.for_granularity(table.granularity);
    let confidence = confidence_window(&input.metric, ranges, &pair);

    tracing::debug!(
        metric = %input.metric,
        aligned = pair.len(),
        worse = split.non_negative.len(),
        better = split.negative.len(),
        "비교 파이프라인 완료"
    );

    Ok(Comparison {
        metric: input.metric.clone(),
        granularity: table.granularity,
        mean_year1: pair.mean_rate_year1(&input.metric),
        mean_year2: pair.mean_rate_year2(&input.metric),
        confidence,
        split,
        deltas,
        pair,
    })
}
