//! Period extraction from raw worksheet rows
//!
//! Turns string cells into typed [`MetricRow`]s: percentage parsing, calendar
//! period labeling (ISO week or month), and the provisional-row filter that
//! drops periods which have not started relative to "now".
//!
//! The ISO week rule matters here: weeks start on Monday and the year a week
//! belongs to can differ from the calendar year of its start date (a late
//! December Monday can open week 1 of the next ISO year). `%W`-style week
//! numbering is not an acceptable approximation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{Granularity, MetricRow, MetricTable};
use crate::sheets::{SheetSchema, SheetTable};

/// Parse a percentage cell like `"12.34%"` into its numeric rate
///
/// The `%` suffix is optional; anything else non-numeric fails the refresh
/// with the offending column and value instead of coercing to zero.
pub fn parse_percent(column: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim().trim_end_matches('%').trim();

    trimmed.parse::<f64>().map_err(|_| Error::Parse {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Parse a volume cell, tolerating thousands separators
pub fn parse_volume(column: &str, value: &str) -> Result<i64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();

    cleaned.parse::<i64>().map_err(|_| Error::Parse {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Parse a date cell ("YYYY-MM-DD", with "." accepted as separator)
pub fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y.%m.%d"))
        .map_err(|_| Error::Parse {
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Calendar labels for one start date under a granularity
fn period_of(date: NaiveDate, granularity: Granularity) -> (i32, u32) {
    match granularity {
        Granularity::Week => {
            let iso = date.iso_week();
            (iso.year(), iso.week())
        }
        Granularity::Month => (date.year(), date.month()),
    }
}

/// Extract typed metric rows from a fetched worksheet
///
/// Rows whose start date has not passed `now` are provisional and dropped;
/// the remainder comes back ordered by ascending start date. Missing declared
/// columns fail with [`Error::DataShape`] before any row is read.
pub fn extract_rows(
    table: &SheetTable,
    schema: &SheetSchema,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Result<MetricTable> {
    let resolved = schema.resolve(&table.worksheet, &table.headers)?;
    let cutoff = now.naive_utc();

    let mut rows = Vec::with_capacity(table.rows.len());

    for raw in &table.rows {
        let date = parse_date(&schema.start_column, table.cell(raw, resolved.start_idx))?;
        let end_date = parse_date(&schema.end_column, table.cell(raw, resolved.end_idx))?;
        let volume = parse_volume(&schema.volume_column, table.cell(raw, resolved.volume_idx))?;

        let mut metrics = BTreeMap::new();
        for (name, idx) in &resolved.metric_idxs {
            let rate = parse_percent(name, table.cell(raw, *idx))?;
            metrics.insert(name.clone(), rate);
        }

        // Provisional rows: the period has not started yet
        let started = date
            .and_hms_opt(0, 0, 0)
            .map(|start| start < cutoff)
            .unwrap_or(false);
        if !started {
            tracing::debug!(date = %date, "미집계 기간 제외");
            continue;
        }

        let (year, period) = period_of(date, granularity);

        rows.push(MetricRow {
            year,
            period,
            period_start: date.format("%m-%d").to_string(),
            period_end: end_date.format("%m-%d").to_string(),
            date,
            volume,
            metrics,
        });
    }

    rows.sort_by_key(|r| r.date);

    Ok(MetricTable {
        granularity,
        metric_names: schema.metric_columns.clone(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SheetSchema {
        SheetSchema {
            metric_columns: vec![String::from("결제")],
            ..SheetSchema::default()
        }
    }

    fn sheet(rows: Vec<Vec<&str>>) -> SheetTable {
        SheetTable {
            worksheet: "주간".to_string(),
            headers: ["기간", "시작일", "종료일", "신규 활성 수업 수", "결제"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        "2025-08-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_parse_percent_round_trip() {
        assert!((parse_percent("결제", "7.25%").unwrap() - 7.25).abs() < 1e-12);
        assert!((parse_percent("결제", "0%").unwrap()).abs() < 1e-12);
        assert!((parse_percent("결제", " 12.5 % ").unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_percent_rejects_non_numeric() {
        let err = parse_percent("결제", "N/A").unwrap_err();
        match err {
            Error::Parse { column, value } => {
                assert_eq!(column, "결제");
                assert_eq!(value, "N/A");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_volume_with_separator() {
        assert_eq!(parse_volume("신규 활성 수업 수", "1,234").unwrap(), 1234);
        assert!(parse_volume("신규 활성 수업 수", "").is_err());
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2024-12-30 is a Monday belonging to ISO 2025, week 1
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let (year, week) = period_of(date, Granularity::Week);
        assert_eq!(year, 2025);
        assert_eq!(week, 1);
    }

    #[test]
    fn test_month_period() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let (year, month) = period_of(date, Granularity::Month);
        assert_eq!(year, 2024);
        assert_eq!(month, 12);
    }

    #[test]
    fn test_extract_basic_row() {
        let table = sheet(vec![vec![
            "2025-2",
            "2025-01-06",
            "2025-01-12",
            "132",
            "5.25%",
        ]]);

        let extracted = extract_rows(&table, &schema(), Granularity::Week, now()).unwrap();
        assert_eq!(extracted.len(), 1);

        let row = &extracted.rows[0];
        assert_eq!(row.year, 2025);
        assert_eq!(row.period, 2);
        assert_eq!(row.period_start, "01-06");
        assert_eq!(row.period_end, "01-12");
        assert_eq!(row.volume, 132);
        assert!((row.rate("결제").unwrap() - 5.25).abs() < 1e-12);
    }

    #[test]
    fn test_extract_drops_provisional_rows() {
        let table = sheet(vec![
            vec!["a", "2025-07-28", "2025-08-03", "120", "5.0%"],
            vec!["b", "2025-08-04", "2025-08-10", "7", "0.1%"],
        ]);

        let extracted = extract_rows(&table, &schema(), Granularity::Week, now()).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.rows[0].period_start, "07-28");
    }

    #[test]
    fn test_extract_orders_by_start_date() {
        let table = sheet(vec![
            vec!["b", "2025-01-13", "2025-01-19", "110", "5.5%"],
            vec!["a", "2025-01-06", "2025-01-12", "120", "5.0%"],
        ]);

        let extracted = extract_rows(&table, &schema(), Granularity::Week, now()).unwrap();
        let periods: Vec<u32> = extracted.rows.iter().map(|r| r.period).collect();
        assert_eq!(periods, vec![2, 3]);
    }

    #[test]
    fn test_extract_missing_columns_is_shape_error() {
        let mut table = sheet(vec![]);
        table.headers.truncate(2);

        let err = extract_rows(&table, &schema(), Granularity::Week, now()).unwrap_err();
        assert!(matches!(err, Error::DataShape { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_extract_bad_metric_cell_halts() {
        let table = sheet(vec![vec![
            "2025-2",
            "2025-01-06",
            "2025-01-12",
            "132",
            "측정불가",
        ]]);

        let err = extract_rows(&table, &schema(), Granularity::Week, now()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
