//! Dashboard JSON API server
//!
//! Serves the computed datasets, comparisons, and narrative reports to the
//! web front-end. Recoverable data errors come back as `success: false`
//! with a Korean notice and empty payloads; the process keeps serving.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analytics::{self, ComparisonInput};
use crate::cache::{CacheConfig, RefreshCache};
use crate::config::{Config, ConfidenceConfig};
use crate::error::Error;
use crate::models::{AlignedPair, DeltaSplit, Granularity, MetricTable};
use crate::present::{self, ComparisonTable, RateChart, VolumeChart};
use crate::report::ReportGenerator;
use crate::sheets::{SheetSchema, SheetSource};

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Remote tabular source
    pub source: Arc<dyn SheetSource>,

    /// Narrative-report collaborator, if configured
    pub reporter: Option<Arc<dyn ReportGenerator>>,

    /// Worksheet column declaration
    pub schema: Arc<SheetSchema>,

    /// Static confidence-window maps
    pub confidence: Arc<ConfidenceConfig>,

    /// Weekly dataset snapshot
    pub week_cache: Arc<RefreshCache<MetricTable>>,

    /// Monthly dataset snapshot
    pub month_cache: Arc<RefreshCache<MetricTable>>,

    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create state with the given collaborators
    pub fn new(
        config: Config,
        source: Arc<dyn SheetSource>,
        reporter: Option<Arc<dyn ReportGenerator>>,
        confidence: ConfidenceConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            source,
            reporter,
            schema: Arc::new(SheetSchema::default()),
            confidence: Arc::new(confidence),
            week_cache: Arc::new(RefreshCache::new(cache_config)),
            month_cache: Arc::new(RefreshCache::new(cache_config)),
            config,
        }
    }

    fn cache_for(&self, granularity: Granularity) -> &RefreshCache<MetricTable> {
        match granularity {
            Granularity::Week => &self.week_cache,
            Granularity::Month => &self.month_cache,
        }
    }

    /// Fetch and extract the dataset for a granularity, via the TTL cache
    pub async fn load_table(&self, granularity: Granularity) -> crate::error::Result<MetricTable> {
        let worksheet = self.config.sheets.worksheet(granularity).to_string();
        let source = self.source.clone();
        let schema = self.schema.clone();

        self.cache_for(granularity)
            .get_or_refresh(|| async move {
                let sheet = source.fetch(&worksheet).await?;
                analytics::extract_rows(&sheet, &schema, granularity, Utc::now())
            })
            .await
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn notice(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Dataset endpoint payload
#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub table: MetricTable,
}

/// Comparison endpoint payload
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub rate_chart: RateChart,
    pub volume_chart: VolumeChart,
    pub table: ComparisonTable,
}

impl CompareResponse {
    fn empty(granularity: Granularity, metric: &str) -> Self {
        let comparison = analytics::Comparison {
            metric: metric.to_string(),
            granularity,
            pair: AlignedPair {
                year1: 0,
                year2: 0,
                rows_year1: Vec::new(),
                rows_year2: Vec::new(),
            },
            deltas: Vec::new(),
            split: DeltaSplit::default(),
            mean_year1: None,
            mean_year2: None,
            confidence: None,
        };
        Self {
            rate_chart: present::rate_chart(&comparison),
            volume_chart: present::volume_chart(&comparison),
            table: present::comparison_table(&comparison),
        }
    }
}

/// Report endpoint payload
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
}

/// Query parameters for the compare endpoint
#[derive(Debug, Deserialize)]
pub struct CompareParams {
    /// Funnel-stage column to compare
    pub metric: String,

    /// Reference year
    pub year1: i32,

    /// Current year; defaults to the present calendar year
    pub year2: Option<i32>,
}

fn parse_granularity(raw: &str) -> Result<Granularity, (StatusCode, String)> {
    raw.parse::<Granularity>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_dataset(
    State(state): State<AppState>,
    Path(granularity): Path<String>,
) -> Result<Json<ApiResponse<DatasetResponse>>, (StatusCode, String)> {
    let granularity = parse_granularity(&granularity)?;

    match state.load_table(granularity).await {
        Ok(table) => Ok(Json(ApiResponse::success(DatasetResponse { table }))),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "데이터셋 로드 실패");
            Ok(Json(ApiResponse::notice(
                DatasetResponse {
                    table: MetricTable::empty(granularity),
                },
                e.korean_desc(),
            )))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn get_compare(
    State(state): State<AppState>,
    Path(granularity): Path<String>,
    Query(params): Query<CompareParams>,
) -> Result<Json<ApiResponse<CompareResponse>>, (StatusCode, String)> {
    let granularity = parse_granularity(&granularity)?;

    let input = ComparisonInput {
        metric: params.metric.clone(),
        year1: params.year1,
        year2: params.year2.unwrap_or_else(|| Utc::now().year()),
    };

    let result = async {
        let table = state.load_table(granularity).await?;
        analytics::compare(&table, &input, &state.confidence)
    }
    .await;

    match result {
        Ok(comparison) => Ok(Json(ApiResponse::success(CompareResponse {
            rate_chart: present::rate_chart(&comparison),
            volume_chart: present::volume_chart(&comparison),
            table: present::comparison_table(&comparison),
        }))),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, metric = %params.metric, "비교 계산 실패");
            Ok(Json(ApiResponse::notice(
                CompareResponse::empty(granularity, &params.metric),
                e.korean_desc(),
            )))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn post_report(
    State(state): State<AppState>,
    Path(granularity): Path<String>,
) -> Result<Json<ApiResponse<ReportResponse>>, (StatusCode, String)> {
    let granularity = parse_granularity(&granularity)?;

    let Some(reporter) = state.reporter.clone() else {
        return Ok(Json(ApiResponse::notice(
            ReportResponse {
                report: String::new(),
            },
            "보고서 생성기가 설정되지 않았습니다",
        )));
    };

    let result = async {
        let table = state.load_table(granularity).await?;
        reporter.generate(&table).await
    }
    .await;

    match result {
        Ok(report) => Ok(Json(ApiResponse::success(ReportResponse { report }))),
        Err(e) if e.is_recoverable() => Ok(Json(ApiResponse::notice(
            ReportResponse {
                report: String::new(),
            },
            e.korean_desc(),
        ))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn post_refresh(
    State(state): State<AppState>,
    Path(granularity): Path<String>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, String)> {
    let granularity = parse_granularity(&granularity)?;

    state.cache_for(granularity).invalidate().await;

    Ok(Json(ApiResponse::success("새로고침 완료".to_string())))
}

// ============================================================================
// Server
// ============================================================================

/// Build the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dataset/{granularity}", get(get_dataset))
        .route("/api/compare/{granularity}", get(get_compare))
        .route("/api/report/{granularity}", post(post_report))
        .route("/api/refresh/{granularity}", post(post_refresh))
        .with_state(state)
}

/// Dashboard API server
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    /// Create a new server around prepared state
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with CORS and request tracing
    pub fn build_router(&self) -> Router {
        create_router(self.state.clone())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until shutdown
    pub async fn start(&self) -> Result<(), Error> {
        let router = self.build_router();
        let addr = format!(
            "{}:{}",
            self.state.config.server.host, self.state.config.server.port
        );

        tracing::info!(addr = %addr, "대시보드 API 서버 시작");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| Error::other(format!("server error: {e}")))?;

        Ok(())
    }
}
