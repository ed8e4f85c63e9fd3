use anyhow::{Context, Result};
use chrono::{Datelike, Utc};

use crate::analytics::{self, extract_rows, ComparisonInput};
use crate::config::{Config, ConfidenceConfig};
use crate::models::Granularity;
use crate::present::{self, DiffTone};
use crate::sheets::{SheetSchema, SheetSource, SheetsClient};

/// Compare one metric between two years and print the result table
pub async fn compare(
    granularity: Granularity,
    metric: String,
    year1: i32,
    year2: Option<i32>,
) -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let year2 = year2.unwrap_or_else(|| Utc::now().year());
    let worksheet = config.sheets.worksheet(granularity).to_string();
    let client = SheetsClient::new(config.sheets).context("Failed to create Sheets client")?;
    let confidence = ConfidenceConfig::load_default();

    let result = async {
        let sheet = client.fetch(&worksheet).await?;
        let table = extract_rows(&sheet, &SheetSchema::default(), granularity, Utc::now())?;
        let input = ComparisonInput {
            metric: metric.clone(),
            year1,
            year2,
        };
        analytics::compare(&table, &input, &confidence)
    }
    .await;

    let comparison = match result {
        Ok(comparison) => comparison,
        Err(e) if e.is_recoverable() => {
            println!("❌ 비교 실패: {}", e.korean_desc());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{metric} 이탈률 분석 ({year1} vs {year2})");
    println!("================================");

    if comparison.pair.is_empty() {
        println!("비교할 수 있는 공통 기간이 없습니다.");
        return Ok(());
    }

    if let (Some(m1), Some(m2)) = (comparison.mean_year1, comparison.mean_year2) {
        println!("  {year1} 평균: {m1:.2}%  |  {year2} 평균: {m2:.2}%");
    }

    if let Some(window) = &comparison.confidence {
        println!(
            "  ⚠ {}{} ~ {}{} 구간은 집계가 완료되지 않아 신뢰도가 낮습니다",
            window.start,
            granularity.period_label(),
            window.end,
            granularity.period_label()
        );
    }
    println!();

    let table = present::comparison_table(&comparison);
    for row in &table.rows {
        let marker = match row.tone {
            DiffTone::Worse => "▲",
            DiffTone::Better => "▼",
            DiffTone::Flat => "-",
        };
        println!(
            "{} ({})  {}% -> {}%  {} {}p.p.  [수업수 {} -> {}]",
            row.period_year2,
            row.range_year2,
            row.rate_year1,
            row.rate_year2,
            marker,
            row.diff_label,
            row.volume_year1,
            row.volume_year2,
        );
    }

    println!();
    println!(
        "악화 {}개 / 개선 {}개 구간",
        comparison.split.non_negative.len(),
        comparison.split.negative.len()
    );

    Ok(())
}
