//! Configuration management for the ital dashboard
//!
//! This module handles loading and validating configuration from environment
//! variables and files, plus the static confidence-window documents
//! (`true_range.json` / `true_range_month.json`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Granularity;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spreadsheet source configuration
    pub sheets: SheetsConfig,

    /// Dashboard API server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Spreadsheet source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Sheets API endpoint base (overridable for tests)
    pub endpoint: String,

    /// Spreadsheet document id
    pub spreadsheet_id: String,

    /// Worksheet title holding the weekly rows
    pub week_worksheet: String,

    /// Worksheet title holding the monthly rows
    pub month_worksheet: String,

    /// API key; the worksheet must be readable with it
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl SheetsConfig {
    /// Worksheet title for a granularity
    pub fn worksheet(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Week => &self.week_worksheet,
            Granularity::Month => &self.month_worksheet,
        }
    }
}

/// Dashboard API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("ITAL_SHEETS_ENDPOINT")
            .unwrap_or_else(|_| String::from("https://sheets.googleapis.com"));

        let spreadsheet_id = std::env::var("ITAL_SPREADSHEET_ID").unwrap_or_default();

        let week_worksheet = std::env::var("ITAL_WEEK_WORKSHEET")
            .unwrap_or_else(|_| String::from("대시보드용_주별타겟신규수업"));

        let month_worksheet = std::env::var("ITAL_MONTH_WORKSHEET")
            .unwrap_or_else(|_| String::from("대시보드용_월별타겟신규수업"));

        let api_key = std::env::var("ITAL_SHEETS_API_KEY").ok();

        let request_timeout_secs = std::env::var("ITAL_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let host = std::env::var("ITAL_HOST").unwrap_or_else(|_| String::from("0.0.0.0"));

        let port = std::env::var("ITAL_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8787);

        let log_level = std::env::var("ITAL_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format = std::env::var("ITAL_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            sheets: SheetsConfig {
                endpoint,
                spreadsheet_id,
                week_worksheet,
                month_worksheet,
                api_key,
                request_timeout_secs,
            },
            server: ServerConfig { host, port },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sheets.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.sheets.week_worksheet.is_empty() || self.sheets.month_worksheet.is_empty() {
            anyhow::bail!("worksheet titles must not be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("server port must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sheets.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets: SheetsConfig {
                endpoint: String::from("https://sheets.googleapis.com"),
                spreadsheet_id: String::new(),
                week_worksheet: String::from("대시보드용_주별타겟신규수업"),
                month_worksheet: String::from("대시보드용_월별타겟신규수업"),
                api_key: None,
                request_timeout_secs: 30,
            },
            server: ServerConfig {
                host: String::from("0.0.0.0"),
                port: 8787,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

/// Static confidence-window configuration
///
/// Maps a funnel-stage name to a negative integer meaning "the last |n|
/// periods are too young to show true churn". Curated by hand, one document
/// per granularity. A metric missing from the map is fully reliable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Weekly unreliability windows
    pub week: BTreeMap<String, i32>,

    /// Monthly unreliability windows
    pub month: BTreeMap<String, i32>,
}

impl ConfidenceConfig {
    /// Default document paths next to the binary
    pub fn default_paths() -> (PathBuf, PathBuf) {
        let week = std::env::var("ITAL_TRUE_RANGE")
            .unwrap_or_else(|_| String::from("./true_range.json"))
            .into();
        let month = std::env::var("ITAL_TRUE_RANGE_MONTH")
            .unwrap_or_else(|_| String::from("./true_range_month.json"))
            .into();
        (week, month)
    }

    /// Load both documents, tolerating missing files
    ///
    /// A missing or unreadable document leaves that granularity's map empty,
    /// which means "treat the entire range as reliable".
    pub fn load(week_path: &Path, month_path: &Path) -> Self {
        Self {
            week: Self::load_one(week_path),
            month: Self::load_one(month_path),
        }
    }

    /// Load using the default/env-configured paths
    pub fn load_default() -> Self {
        let (week, month) = Self::default_paths();
        Self::load(&week, &month)
    }

    fn load_one(path: &Path) -> BTreeMap<String, i32> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "신뢰구간 설정 파일 없음, 전체 구간을 신뢰합니다");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "신뢰구간 설정 파싱 실패, 전체 구간을 신뢰합니다");
                BTreeMap::new()
            }
        }
    }

    /// The map for one granularity
    pub fn for_granularity(&self, granularity: Granularity) -> &BTreeMap<String, i32> {
        match granularity {
            Granularity::Week => &self.week,
            Granularity::Month => &self.month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = Config::default();
        config.sheets.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        let timeout = config.request_timeout();
        assert_eq!(timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_worksheet_selection() {
        let config = Config::default();
        assert!(config.sheets.worksheet(Granularity::Week).contains("주별"));
        assert!(config.sheets.worksheet(Granularity::Month).contains("월별"));
    }

    #[test]
    fn test_confidence_config_parse() {
        let json = r#"{"결제": -2, "DM 3 총 이탈": -13}"#;
        let map: BTreeMap<String, i32> = serde_json::from_str(json).unwrap();
        let config = ConfidenceConfig {
            week: map,
            month: BTreeMap::new(),
        };
        assert_eq!(config.for_granularity(Granularity::Week)["결제"], -2);
        assert!(config.for_granularity(Granularity::Month).is_empty());
    }

    #[test]
    fn test_confidence_config_missing_file() {
        let config = ConfidenceConfig::load(
            Path::new("/nonexistent/true_range.json"),
            Path::new("/nonexistent/true_range_month.json"),
        );
        assert!(config.week.is_empty());
        assert!(config.month.is_empty());
    }
}
