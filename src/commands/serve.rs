use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cache::CacheConfig;
use crate::config::{Config, ConfidenceConfig};
use crate::report::{GeminiClient, ReportConfig, ReportGenerator};
use crate::server::{AppState, DashboardServer};
use crate::sheets::SheetsClient;

/// Run the dashboard API server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let source =
        Arc::new(SheetsClient::new(config.sheets.clone()).context("Failed to create Sheets client")?);

    let report_config = ReportConfig::from_env();
    let reporter: Option<Arc<dyn ReportGenerator>> = if report_config.api_key.is_some() {
        Some(Arc::new(
            GeminiClient::with_config(report_config).context("Failed to create report client")?,
        ))
    } else {
        tracing::warn!("GENAI API 키 없음, 보고서 기능 비활성화");
        None
    };

    let confidence = ConfidenceConfig::load_default();
    let cache_config = CacheConfig::from_env();

    let state = AppState::new(config, source, reporter, confidence, &cache_config);
    let server = DashboardServer::new(state);

    server.start().await?;

    Ok(())
}
