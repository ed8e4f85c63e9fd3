//! Presentation payloads for charts and tables
//!
//! Builds the serializable structures a front-end turns into plot traces,
//! table rows, and conditional formatting. One parameterized builder covers
//! both granularities; nothing here draws anything, and this is the only
//! layer that rounds values for display.

use serde::{Deserialize, Serialize};

use crate::models::{ConfidenceWindow, DeltaRow, Granularity, MetricRow};

use crate::analytics::Comparison;

/// Hover payload for one line-chart point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceHover {
    /// "MM-DD~MM-DD"
    pub date_range: String,

    /// New-entity count in the period
    pub volume: i64,
}

/// One year's churn-rate line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesTrace {
    pub year: i32,
    pub periods: Vec<u32>,
    pub rates: Vec<f64>,
    pub hover: Vec<TraceHover>,
}

impl SeriesTrace {
    fn build(year: i32, rows: &[MetricRow], metric: &str) -> Self {
        Self {
            year,
            periods: rows.iter().map(|r| r.period).collect(),
            rates: rows
                .iter()
                .map(|r| r.rate(metric).unwrap_or_default())
                .collect(),
            hover: rows
                .iter()
                .map(|r| TraceHover {
                    date_range: r.date_range_label(),
                    volume: r.volume,
                })
                .collect(),
        }
    }
}

/// Marker overlay for one sign partition of the deltas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaMarkers {
    pub periods: Vec<u32>,
    pub rates: Vec<f64>,

    /// Signed p.p. difference, rounded to 3 decimals for hover text
    pub diff_pp: Vec<f64>,
}

impl DeltaMarkers {
    fn build(deltas: &[DeltaRow]) -> Self {
        Self {
            periods: deltas.iter().map(|d| d.period).collect(),
            rates: deltas.iter().map(|d| d.rate_year2).collect(),
            diff_pp: deltas
                .iter()
                .map(|d| (d.diff_pp * 1000.0).round() / 1000.0)
                .collect(),
        }
    }
}

/// Shaded low-confidence region at the tail of the chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub start: u32,
    pub end: u32,

    /// e.g. "신뢰도 낮음 (6주)"
    pub label: String,
}

impl ConfidenceBand {
    fn build(window: &ConfidenceWindow, granularity: Granularity) -> Self {
        let unit = match granularity {
            Granularity::Week => "주",
            Granularity::Month => "개월",
        };
        Self {
            start: window.start,
            end: window.end,
            label: format!("신뢰도 낮음 ({}{unit})", window.periods),
        }
    }
}

/// Full churn-rate chart payload for one comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChart {
    /// e.g. "결제 (2024 vs 2025)"
    pub title: String,

    pub granularity: Granularity,
    pub year1_trace: SeriesTrace,
    pub year2_trace: SeriesTrace,

    /// Periods where the rate rose year-over-year (worsened)
    pub worse_markers: DeltaMarkers,

    /// Periods where the rate fell (improved)
    pub better_markers: DeltaMarkers,

    /// e.g. "2024 평균: 5.25%"
    pub mean_year1: Option<String>,
    pub mean_year2: Option<String>,

    pub confidence: Option<ConfidenceBand>,
}

/// Overlaid per-year volume bars under the rate chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeChart {
    pub periods: Vec<u32>,
    pub volumes_year1: Vec<i64>,
    pub volumes_year2: Vec<i64>,

    /// Signed year-over-year count difference per period
    pub diffs: Vec<i64>,
}

/// Conditional-formatting hint for the diff column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTone {
    /// Rate rose: render in red
    Worse,
    /// Rate fell: render in green
    Better,
    /// No change: no special color
    Flat,
}

impl DiffTone {
    fn from_diff(diff_pp: f64) -> Self {
        if diff_pp > 0.0 {
            Self::Worse
        } else if diff_pp < 0.0 {
            Self::Better
        } else {
            Self::Flat
        }
    }

    /// CSS color used by the original table styling
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Worse => Some("#d32f2f"),
            Self::Better => Some("#2e7d32"),
            Self::Flat => None,
        }
    }
}

/// One row of the side-by-side comparison table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    /// "{year1}-{period}"
    pub period_year1: String,
    /// "MM-DD~MM-DD" of the reference year
    pub range_year1: String,
    pub volume_year1: i64,
    /// Rate with 2 decimals, display only
    pub rate_year1: String,

    pub period_year2: String,
    pub range_year2: String,
    pub volume_year2: i64,
    pub rate_year2: String,

    /// Exact p.p. difference
    pub diff_pp: f64,

    /// "+1.50" style display value
    pub diff_label: String,

    pub tone: DiffTone,
}

/// Side-by-side comparison table for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub metric: String,
    pub granularity: Granularity,
    pub rows: Vec<TableRow>,
}

/// Build the rate chart payload from a computed comparison
pub fn rate_chart(comparison: &Comparison) -> RateChart {
    let pair = &comparison.pair;
    let metric = &comparison.metric;

    RateChart {
        title: format!("{metric} ({} vs {})", pair.year1, pair.year2),
        granularity: comparison.granularity,
        year1_trace: SeriesTrace::build(pair.year1, &pair.rows_year1, metric),
        year2_trace: SeriesTrace::build(pair.year2, &pair.rows_year2, metric),
        worse_markers: DeltaMarkers::build(&comparison.split.non_negative),
        better_markers: DeltaMarkers::build(&comparison.split.negative),
        mean_year1: comparison
            .mean_year1
            .map(|m| format!("{} 평균: {m:.2}%", pair.year1)),
        mean_year2: comparison
            .mean_year2
            .map(|m| format!("{} 평균: {m:.2}%", pair.year2)),
        confidence: comparison
            .confidence
            .as_ref()
            .map(|w| ConfidenceBand::build(w, comparison.granularity)),
    }
}

/// Build the volume chart payload from a computed comparison
pub fn volume_chart(comparison: &Comparison) -> VolumeChart {
    VolumeChart {
        periods: comparison.deltas.iter().map(|d| d.period).collect(),
        volumes_year1: comparison.deltas.iter().map(|d| d.volume_year1).collect(),
        volumes_year2: comparison.deltas.iter().map(|d| d.volume_year2).collect(),
        diffs: comparison.deltas.iter().map(|d| d.diff_count).collect(),
    }
}

/// Build the comparison table from a computed comparison
pub fn comparison_table(comparison: &Comparison) -> ComparisonTable {
    let pair = &comparison.pair;

    let rows = pair
        .rows_year1
        .iter()
        .zip(&pair.rows_year2)
        .zip(&comparison.deltas)
        .map(|((a, b), d)| TableRow {
            period_year1: a.period_key(),
            range_year1: a.date_range_label(),
            volume_year1: a.volume,
            rate_year1: format!("{:.2}", d.rate_year1),
            period_year2: b.period_key(),
            range_year2: b.date_range_label(),
            volume_year2: b.volume,
            rate_year2: format!("{:.2}", d.rate_year2),
            diff_pp: d.diff_pp,
            diff_label: format!("{:+.2}", d.diff_pp),
            tone: DiffTone::from_diff(d.diff_pp),
        })
        .collect();

    ComparisonTable {
        metric: comparison.metric.clone(),
        granularity: comparison.granularity,
        rows,
    }
}
