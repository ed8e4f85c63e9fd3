//! Tests for models module

mod common;

use common::{weekly_row, weekly_table};
use ital::models::{Granularity, MetricTable};

#[test]
fn test_table_years_sorted_and_deduped() {
    let table = weekly_table(vec![
        weekly_row(2025, 1, 6.0, 110),
        weekly_row(2024, 1, 5.0, 100),
        weekly_row(2024, 2, 5.0, 100),
    ]);

    assert_eq!(table.years(), vec![2024, 2025]);
    assert_eq!(table.rows_for_year(2024).len(), 2);
}

#[test]
fn test_summary_spans_both_years() {
    let table = weekly_table(vec![
        weekly_row(2024, 1, 5.0, 100),
        weekly_row(2025, 8, 6.0, 110),
    ]);

    let summary = table.summary().unwrap();
    assert_eq!(summary.min_year, 2024);
    assert_eq!(summary.max_year, 2025);
    assert!(summary.min_date < summary.max_date);
    assert_eq!(summary.row_count, 2);
}

#[test]
fn test_text_table_lists_every_row() {
    let table = weekly_table(vec![
        weekly_row(2024, 1, 5.0, 100),
        weekly_row(2024, 2, 5.5, 101),
    ]);

    let text = table.to_text_table();
    // Header plus one line per row
    assert_eq!(text.trim_end().lines().count(), 3);
    assert!(text.contains("결제"));
    assert!(text.contains("5.50"));
}

#[test]
fn test_metric_table_serde_round_trip() {
    let table = weekly_table(vec![weekly_row(2025, 2, 6.25, 132)]);

    let json = serde_json::to_string(&table).unwrap();
    let back: MetricTable = serde_json::from_str(&json).unwrap();

    assert_eq!(back.granularity, Granularity::Week);
    assert_eq!(back.rows.len(), 1);
    assert_eq!(back.rows[0].rate("결제"), Some(6.25));
    assert_eq!(back.rows[0].period, 2);
}

#[test]
fn test_granularity_serde_lowercase() {
    assert_eq!(serde_json::to_string(&Granularity::Week).unwrap(), "\"week\"");
    let parsed: Granularity = serde_json::from_str("\"month\"").unwrap();
    assert_eq!(parsed, Granularity::Month);
}
