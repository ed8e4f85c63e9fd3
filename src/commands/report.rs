use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use crate::analytics::extract_rows;
use crate::config::Config;
use crate::models::Granularity;
use crate::report::{GeminiClient, ReportGenerator};
use crate::sheets::{SheetSchema, SheetSource, SheetsClient};

/// Generate the AI narrative report for the full dataset
pub async fn report(granularity: Granularity, output: Option<PathBuf>) -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let worksheet = config.sheets.worksheet(granularity).to_string();
    let client = SheetsClient::new(config.sheets).context("Failed to create Sheets client")?;
    let reporter = GeminiClient::from_env().context("Failed to create report client")?;

    println!("AI 보고서 생성 중...");

    let result = async {
        let sheet = client.fetch(&worksheet).await?;
        let table = extract_rows(&sheet, &SheetSchema::default(), granularity, Utc::now())?;
        reporter.generate(&table).await
    }
    .await;

    let text = match result {
        Ok(text) => text,
        Err(e) if e.is_recoverable() => {
            println!("❌ 보고서 생성 실패: {}", e.korean_desc());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &text)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ 보고서 저장 완료: {}", path.display());
        }
        None => {
            println!("================================");
            println!("{text}");
        }
    }

    Ok(())
}
