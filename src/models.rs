// Core data structures for the ital dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Calendar bucket size used for period labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// ISO week (Monday start, ISO year boundary rule)
    Week,
    /// Calendar month
    Month,
}

impl Granularity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Get Korean name
    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::Week => "주별",
            Self::Month => "월별",
        }
    }

    /// Korean label of the period column ("주차" or "월")
    pub fn period_label(&self) -> &'static str {
        match self {
            Self::Week => "주차",
            Self::Month => "월",
        }
    }

    /// Largest valid period number (ISO week 53, month 12)
    pub fn max_period(&self) -> u32 {
        match self {
            Self::Week => 53,
            Self::Month => 12,
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" | "w" | "주별" => Ok(Self::Week),
            "month" | "m" | "월별" => Ok(Self::Month),
            other => Err(format!("unknown granularity '{other}' (expected week|month)")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation for one calendar period
///
/// Produced fresh on every refresh; downstream steps derive new containers
/// instead of mutating rows in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    /// Calendar year for months, ISO year for weeks
    pub year: i32,

    /// ISO week number (1-53) or month number (1-12)
    pub period: u32,

    /// Display start of the period, "MM-DD"
    pub period_start: String,

    /// Display end of the period, "MM-DD"
    pub period_end: String,

    /// True start date, used for ordering and provisional-row filtering
    pub date: NaiveDate,

    /// Count of new entities observed in the period
    pub volume: i64,

    /// Funnel-stage name to churn rate (0-100, percent)
    pub metrics: BTreeMap<String, f64>,
}

impl MetricRow {
    /// Rate for one funnel stage, if present
    pub fn rate(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied()
    }

    /// "MM-DD~MM-DD" range label used by tables and hover text
    pub fn date_range_label(&self) -> String {
        format!("{}~{}", self.period_start, self.period_end)
    }

    /// "{year}-{period}" label used by tables
    pub fn period_key(&self) -> String {
        format!("{}-{}", self.year, self.period)
    }
}

/// Scalar facts about a dataset, used for report prompts and CLI summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub min_year: i32,
    pub max_year: i32,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub row_count: usize,
}

/// Full extracted dataset for one worksheet and granularity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTable {
    /// Calendar bucketing of the rows
    pub granularity: Granularity,

    /// Declared funnel-stage columns, in worksheet order
    pub metric_names: Vec<String>,

    /// Rows ordered by ascending start date
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Create an empty table (the recoverable-error output shape)
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            metric_names: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct years present, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Rows belonging to one year, in stored (ascending-date) order
    pub fn rows_for_year(&self, year: i32) -> Vec<&MetricRow> {
        self.rows.iter().filter(|r| r.year == year).collect()
    }

    /// Scalar summary, or None for an empty table
    pub fn summary(&self) -> Option<TableSummary> {
        let min_year = self.rows.iter().map(|r| r.year).min()?;
        let max_year = self.rows.iter().map(|r| r.year).max()?;
        let min_date = self.rows.iter().map(|r| r.date).min()?;
        let max_date = self.rows.iter().map(|r| r.date).max()?;
        Some(TableSummary {
            min_year,
            max_year,
            min_date,
            max_date,
            row_count: self.rows.len(),
        })
    }

    /// Render the whole dataset as a human-readable text block
    ///
    /// This is the opaque tabular text handed to the narrative-report
    /// collaborator; nothing parses it back.
    pub fn to_text_table(&self) -> String {
        let mut out = String::new();
        out.push_str("연도\t");
        out.push_str(self.granularity.period_label());
        out.push_str("\t시작일\t종료일\t신규수\t");
        out.push_str(&self.metric_names.join("\t"));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}",
                row.year, row.period, row.period_start, row.period_end, row.volume
            ));
            for name in &self.metric_names {
                match row.rate(name) {
                    Some(rate) => out.push_str(&format!("\t{rate:.2}")),
                    None => out.push_str("\t-"),
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Two equal-length row sequences windowed to the comparable period range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedPair {
    /// Reference (earlier) year
    pub year1: i32,

    /// Current (later) year
    pub year2: i32,

    /// Rows of the reference year
    pub rows_year1: Vec<MetricRow>,

    /// Rows of the current year, same length as `rows_year1`
    pub rows_year2: Vec<MetricRow>,
}

impl AlignedPair {
    /// Number of aligned positions (both sides always agree)
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.rows_year1.len(), self.rows_year2.len());
        self.rows_year1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows_year1.is_empty()
    }

    /// Mean rate of one metric on the reference-year side
    pub fn mean_rate_year1(&self, metric: &str) -> Option<f64> {
        mean_rate(&self.rows_year1, metric)
    }

    /// Mean rate of one metric on the current-year side
    pub fn mean_rate_year2(&self, metric: &str) -> Option<f64> {
        mean_rate(&self.rows_year2, metric)
    }
}

fn mean_rate(rows: &[MetricRow], metric: &str) -> Option<f64> {
    let rates: Vec<f64> = rows.iter().filter_map(|r| r.rate(metric)).collect();
    if rates.is_empty() {
        return None;
    }
    Some(rates.iter().sum::<f64>() / rates.len() as f64)
}

/// Row-aligned period-over-period difference for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaRow {
    /// Period number on the current-year side
    pub period: u32,

    pub rate_year1: f64,
    pub rate_year2: f64,

    /// `rate_year2 - rate_year1`, percentage points, stored exact
    pub diff_pp: f64,

    pub volume_year1: i64,
    pub volume_year2: i64,

    /// `volume_year2 - volume_year1`
    pub diff_count: i64,
}

/// Order-preserving sign partition of delta rows
///
/// Non-negative means the rate went up year-over-year, which reads as a
/// deterioration for churn metrics; negative is an improvement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaSplit {
    pub non_negative: Vec<DeltaRow>,
    pub negative: Vec<DeltaRow>,
}

impl DeltaSplit {
    /// Combined length of both partitions
    pub fn total_len(&self) -> usize {
        self.non_negative.len() + self.negative.len()
    }
}

/// Trailing period range flagged as not yet matured for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceWindow {
    /// First flagged period (inclusive)
    pub start: u32,

    /// Last flagged period (inclusive)
    pub end: u32,

    /// Number of trailing periods the metric needs to mature
    pub periods: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, period: u32, rate: f64) -> MetricRow {
        let mut metrics = BTreeMap::new();
        metrics.insert("결제".to_string(), rate);
        MetricRow {
            year,
            period,
            period_start: "01-06".to_string(),
            period_end: "01-12".to_string(),
            date: NaiveDate::from_ymd_opt(year, 1, 6).unwrap(),
            volume: 100,
            metrics,
        }
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("M".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("quarter".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_granularity_labels() {
        assert_eq!(Granularity::Week.period_label(), "주차");
        assert_eq!(Granularity::Month.korean_name(), "월별");
        assert_eq!(Granularity::Month.max_period(), 12);
    }

    #[test]
    fn test_row_labels() {
        let r = row(2025, 2, 5.0);
        assert_eq!(r.period_key(), "2025-2");
        assert_eq!(r.date_range_label(), "01-06~01-12");
    }

    #[test]
    fn test_table_years_and_summary() {
        let table = MetricTable {
            granularity: Granularity::Week,
            metric_names: vec!["결제".to_string()],
            rows: vec![row(2024, 2, 5.0), row(2025, 2, 6.0), row(2024, 3, 5.5)],
        };
        assert_eq!(table.years(), vec![2024, 2025]);

        let summary = table.summary().unwrap();
        assert_eq!(summary.min_year, 2024);
        assert_eq!(summary.max_year, 2025);
        assert_eq!(summary.row_count, 3);
    }

    #[test]
    fn test_empty_table_summary() {
        let table = MetricTable::empty(Granularity::Month);
        assert!(table.is_empty());
        assert!(table.summary().is_none());
    }

    #[test]
    fn test_text_table_contains_rates() {
        let table = MetricTable {
            granularity: Granularity::Week,
            metric_names: vec!["결제".to_string()],
            rows: vec![row(2024, 2, 5.25)],
        };
        let text = table.to_text_table();
        assert!(text.contains("주차"));
        assert!(text.contains("5.25"));
    }

    #[test]
    fn test_aligned_pair_means() {
        let pair = AlignedPair {
            year1: 2024,
            year2: 2025,
            rows_year1: vec![row(2024, 1, 4.0), row(2024, 2, 6.0)],
            rows_year2: vec![row(2025, 1, 5.0), row(2025, 2, 7.0)],
        };
        assert_eq!(pair.len(), 2);
        assert!((pair.mean_rate_year1("결제").unwrap() - 5.0).abs() < 1e-9);
        assert!((pair.mean_rate_year2("결제").unwrap() - 6.0).abs() < 1e-9);
        assert!(pair.mean_rate_year1("없는지표").is_none());
    }

    #[test]
    fn test_delta_split_total_len() {
        let split = DeltaSplit::default();
        assert_eq!(split.total_len(), 0);
    }
}
