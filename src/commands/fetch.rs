use anyhow::{Context, Result};
use chrono::Utc;

use crate::analytics::extract_rows;
use crate::config::Config;
use crate::models::Granularity;
use crate::sheets::{SheetSchema, SheetSource, SheetsClient};

/// Fetch one worksheet and print the extracted dataset
pub async fn fetch(granularity: Granularity) -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let worksheet = config.sheets.worksheet(granularity).to_string();
    let client = SheetsClient::new(config.sheets).context("Failed to create Sheets client")?;
    let schema = SheetSchema::default();

    println!("{} 데이터 조회: {worksheet}", granularity.korean_name());
    println!("================================");

    let result = async {
        let sheet = client.fetch(&worksheet).await?;
        extract_rows(&sheet, &schema, granularity, Utc::now())
    }
    .await;

    let table = match result {
        Ok(table) => table,
        Err(e) if e.is_recoverable() => {
            println!("❌ 데이터 로드 실패: {}", e.korean_desc());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("✅ 데이터 로드 성공! ({}행)", table.len());

    if let Some(summary) = table.summary() {
        println!(
            "  기간: {} ~ {} ({}년~{}년)",
            summary.min_date, summary.max_date, summary.min_year, summary.max_year
        );
    }
    println!("  구간: {}", table.metric_names.join(", "));
    println!();
    print!("{}", table.to_text_table());

    Ok(())
}
