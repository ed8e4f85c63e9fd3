//! Google Sheets data source
//!
//! The raw churn table lives in a shared spreadsheet; this module fetches a
//! worksheet through the Sheets API v4 `values.get` endpoint and validates
//! its header row against an explicitly declared schema. Implicit
//! "everything after the third column is a metric" slicing is deliberately
//! absent: the metric columns are named up front and checked at load time.
//!
//! Credential acquisition is out of scope; the client takes a ready API key
//! from [`SheetsConfig`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::SheetsConfig;
use crate::error::{Error, Result};

/// Explicit column declaration for one worksheet family
///
/// Both the weekly and the monthly worksheet share this arrangement: a
/// row-unique label, start/end date strings, an integer volume column, then
/// one percentage column per funnel stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSchema {
    /// Row-unique text label column
    pub label_column: String,

    /// Period start date column ("YYYY-MM-DD")
    pub start_column: String,

    /// Period end date column ("YYYY-MM-DD")
    pub end_column: String,

    /// New-entity count column
    pub volume_column: String,

    /// Declared funnel-stage columns, in worksheet order
    pub metric_columns: Vec<String>,
}

impl Default for SheetSchema {
    fn default() -> Self {
        Self {
            label_column: String::from("기간"),
            start_column: String::from("시작일"),
            end_column: String::from("종료일"),
            volume_column: String::from("신규 활성 수업 수"),
            metric_columns: vec![
                String::from("결제"),
                String::from("과외신청서"),
                String::from("1. 결제 직후 매칭 전"),
                String::from("2. 매칭 직후 첫 수업 전"),
                String::from("3. 첫 수업 후 2회차 수업 전"),
                String::from("4. 2회차 수업 후 DM 1.0 이하"),
                String::from("5. DM 1 총 이탈"),
                String::from("DM 3 총 이탈"),
                String::from("DM 4 총 이탈 (4미만)"),
                String::from("단골 전환 4개월 이상"),
            ],
        }
    }
}

/// Column indexes after matching a schema against a fetched header row
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub start_idx: usize,
    pub end_idx: usize,
    pub volume_idx: usize,

    /// (metric name, column index), in declared order
    pub metric_idxs: Vec<(String, usize)>,
}

impl SheetSchema {
    /// Match the declared columns against a fetched header row
    ///
    /// Any absent column fails the whole resolution with a
    /// [`Error::DataShape`] listing every missing name at once.
    pub fn resolve(&self, worksheet: &str, headers: &[String]) -> Result<ResolvedSchema> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut missing = Vec::new();

        let start_idx = find(&self.start_column);
        if start_idx.is_none() {
            missing.push(self.start_column.clone());
        }
        let end_idx = find(&self.end_column);
        if end_idx.is_none() {
            missing.push(self.end_column.clone());
        }
        let volume_idx = find(&self.volume_column);
        if volume_idx.is_none() {
            missing.push(self.volume_column.clone());
        }

        let mut metric_idxs = Vec::with_capacity(self.metric_columns.len());
        for name in &self.metric_columns {
            match find(name) {
                Some(idx) => metric_idxs.push((name.clone(), idx)),
                None => missing.push(name.clone()),
            }
        }

        match (start_idx, end_idx, volume_idx) {
            (Some(start_idx), Some(end_idx), Some(volume_idx)) if missing.is_empty() => {
                Ok(ResolvedSchema {
                    start_idx,
                    end_idx,
                    volume_idx,
                    metric_idxs,
                })
            }
            _ => Err(Error::DataShape {
                worksheet: worksheet.to_string(),
                missing,
            }),
        }
    }
}

/// One fetched worksheet: header row plus row-major string cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetTable {
    /// Worksheet title the table came from
    pub worksheet: String,

    /// Header row
    pub headers: Vec<String>,

    /// Data rows; ragged rows are padded with empty strings on access
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Cell content at (row, column), empty string when the row is ragged
    pub fn cell<'a>(&'a self, row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sheets API v4 `values.get` response body
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl ValuesResponse {
    /// Convert the first row to headers and the rest to string cells
    fn into_table(self, worksheet: &str) -> SheetTable {
        let mut rows = self.values.into_iter().map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect::<Vec<String>>()
        });

        let headers = rows.next().unwrap_or_default();

        SheetTable {
            worksheet: worksheet.to_string(),
            headers,
            rows: rows.collect(),
        }
    }
}

/// Abstraction over the remote tabular source
///
/// The HTTP client implements it for production; tests substitute fixtures.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch one worksheet by title
    async fn fetch(&self, worksheet: &str) -> Result<SheetTable>;
}

/// Sheets API v4 client
pub struct SheetsClient {
    client: Client,
    config: SheetsConfig,
}

impl SheetsClient {
    /// Create a new client from config
    pub fn new(config: SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build the `values.get` URL for a worksheet title
    fn values_url(&self, worksheet: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| Error::config(format!("invalid sheets endpoint: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| Error::config("sheets endpoint cannot be a base URL"))?
            .extend(&[
                "v4",
                "spreadsheets",
                &self.config.spreadsheet_id,
                "values",
                worksheet,
            ]);

        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn fetch(&self, worksheet: &str) -> Result<SheetTable> {
        let url = self.values_url(worksheet)?;

        tracing::info!(worksheet = %worksheet, "worksheet 조회");

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let values: ValuesResponse = response.json().await?;
        let table = values.into_table(worksheet);

        tracing::info!(worksheet = %worksheet, rows = table.rows.len(), "worksheet 로드 완료");

        Ok(table)
    }
}
