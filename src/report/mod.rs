//! Narrative report generation via Gemini
//!
//! Hands the full unaligned dataset to a generative-text service and returns
//! a Korean prose report. The dataset goes in as an opaque text table plus a
//! few derived scalars for the prompt; nothing parses the model output back.

use async_trait::async_trait;
use handlebars::Handlebars;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::MetricTable;

/// Default report prompt template
const REPORT_TEMPLATE: &str = include_str!("../../templates/report.hbs");

/// Configuration for the report client
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Generative-language API endpoint base
    pub endpoint: String,

    /// Model name to use
    pub model: String,

    /// API key
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ReportConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("ITAL_GENAI_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            model: std::env::var("ITAL_GENAI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            api_key: std::env::var("ITAL_GENAI_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .ok(),
            timeout_secs: std::env::var("ITAL_GENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }
}

/// Template data for the report prompt
#[derive(Debug, Serialize)]
struct ReportTemplateData {
    granularity_korean: String,
    period_label: String,
    min_year: i32,
    max_year: i32,
    min_date: String,
    max_date: String,
    row_count: usize,
    data_text: String,
}

/// Build the Korean report prompt for a dataset
pub fn build_prompt(table: &MetricTable) -> Result<String> {
    let summary = table
        .summary()
        .ok_or_else(|| Error::report("보고서를 생성할 데이터가 없습니다"))?;

    let data = ReportTemplateData {
        granularity_korean: table.granularity.korean_name().to_string(),
        period_label: table.granularity.period_label().to_string(),
        min_year: summary.min_year,
        max_year: summary.max_year,
        min_date: summary.min_date.format("%Y년 %m월").to_string(),
        max_date: summary.max_date.format("%Y년 %m월").to_string(),
        row_count: summary.row_count,
        data_text: table.to_text_table(),
    };

    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("report", REPORT_TEMPLATE)
        .map_err(|e| Error::report(format!("프롬프트 템플릿 오류: {e}")))?;

    handlebars
        .render("report", &data)
        .map_err(|e| Error::report(format!("프롬프트 렌더링 실패: {e}")))
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

/// Abstraction over the narrative-report collaborator
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Generate a narrative report for the full dataset
    async fn generate(&self, table: &MetricTable) -> Result<String>;
}

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    config: ReportConfig,
}

impl GeminiClient {
    /// Create a new client with custom config
    pub fn with_config(config: ReportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(ReportConfig::from_env())
    }

    fn generate_url(&self) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("GENAI API 키가 설정되지 않았습니다"))?;

        Ok(format!(
            "{}/v1beta/models/{}:generateContent?key={key}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        ))
    }
}

#[async_trait]
impl ReportGenerator for GeminiClient {
    async fn generate(&self, table: &MetricTable) -> Result<String> {
        let prompt = build_prompt(table)?;
        let url = self.generate_url()?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        tracing::info!(model = %self.config.model, rows = table.len(), "보고서 생성 요청");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GeminiResponse = response.json().await?;

        let text: String = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::report("응답에 보고서 본문이 없습니다"));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Granularity, MetricRow};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn table() -> MetricTable {
        let mut metrics = BTreeMap::new();
        metrics.insert("결제".to_string(), 5.25);
        MetricTable {
            granularity: Granularity::Week,
            metric_names: vec!["결제".to_string()],
            rows: vec![MetricRow {
                year: 2025,
                period: 2,
                period_start: "01-06".to_string(),
                period_end: "01-12".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                volume: 132,
                metrics,
            }],
        }
    }

    #[test]
    fn test_build_prompt_contains_data() {
        let prompt = build_prompt(&table()).unwrap();
        assert!(prompt.contains("주별"));
        assert!(prompt.contains("2025년 01월"));
        assert!(prompt.contains("5.25"));
        assert!(prompt.contains("500-700단어"));
    }

    #[test]
    fn test_build_prompt_empty_table_fails() {
        let empty = MetricTable::empty(Granularity::Month);
        let err = build_prompt(&empty).unwrap_err();
        assert!(matches!(err, Error::Report(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_report_config_default() {
        let config = ReportConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_generate_url_requires_key() {
        let client = GeminiClient::with_config(ReportConfig::default()).unwrap();
        assert!(client.generate_url().is_err());

        let client = GeminiClient::with_config(ReportConfig {
            api_key: Some("test-key".to_string()),
            ..ReportConfig::default()
        })
        .unwrap();
        let url = client.generate_url().unwrap();
        assert!(url.contains("gemini-2.0-flash:generateContent"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn test_response_parsing() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "이탈률 분석 "}, {"text": "보고서"}]
                }
            }]
        });
        let parsed: GeminiResponse = serde_json::from_value(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "이탈률 분석 보고서");
    }
}
