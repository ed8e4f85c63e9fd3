//! Common test utilities

use chrono::{NaiveDate, Weekday};
use ital::models::{Granularity, MetricRow, MetricTable};
use std::collections::BTreeMap;

/// Create a weekly metric row for one ISO (year, week)
#[allow(dead_code)]
pub fn weekly_row(year: i32, week: u32, rate: f64, volume: i64) -> MetricRow {
    let date = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .expect("valid ISO week");
    let mut metrics = BTreeMap::new();
    metrics.insert("결제".to_string(), rate);

    MetricRow {
        year,
        period: week,
        period_start: date.format("%m-%d").to_string(),
        period_end: (date + chrono::Duration::days(6)).format("%m-%d").to_string(),
        date,
        volume,
        metrics,
    }
}

/// Create a weekly table over two years of rows
#[allow(dead_code)]
pub fn weekly_table(rows: Vec<MetricRow>) -> MetricTable {
    MetricTable {
        granularity: Granularity::Week,
        metric_names: vec!["결제".to_string()],
        rows,
    }
}

/// Monday start date of an ISO (year, week), "YYYY-MM-DD"
#[allow(dead_code)]
pub fn week_start(year: i32, week: u32) -> String {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .expect("valid ISO week")
        .format("%Y-%m-%d")
        .to_string()
}

/// Sunday end date of an ISO (year, week), "YYYY-MM-DD"
#[allow(dead_code)]
pub fn week_end(year: i32, week: u32) -> String {
    (NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).expect("valid ISO week")
        + chrono::Duration::days(6))
    .format("%Y-%m-%d")
    .to_string()
}

/// Sheets API `values.get` response body for a weekly worksheet
///
/// `series` is (iso_year, weeks, rate_percent, base_volume) per comparison
/// year; rows carry one metric column "결제".
#[allow(dead_code)]
pub fn sheet_values_body(series: &[(i32, std::ops::RangeInclusive<u32>, f64, i64)]) -> serde_json::Value {
    let mut values = vec![vec![
        serde_json::json!("기간"),
        serde_json::json!("시작일"),
        serde_json::json!("종료일"),
        serde_json::json!("신규 활성 수업 수"),
        serde_json::json!("결제"),
    ]];

    for (year, weeks, rate, base_volume) in series {
        for week in weeks.clone() {
            values.push(vec![
                serde_json::json!(format!("{year}-{week}")),
                serde_json::json!(week_start(*year, week)),
                serde_json::json!(week_end(*year, week)),
                serde_json::json!((base_volume + week as i64).to_string()),
                serde_json::json!(format!("{rate:.2}%")),
            ]);
        }
    }

    serde_json::json!({
        "range": "'weekly'!A1:E100",
        "majorDimension": "ROWS",
        "values": values
    })
}
