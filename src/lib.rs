//! ital - Churn-Rate Comparison Dashboard
//!
//! A reporting backend that pulls weekly/monthly funnel-stage churn metrics
//! from a spreadsheet source, aligns a reference year against the current
//! year, computes period-over-period deltas, and serves chart/table payloads
//! plus an optional AI narrative report.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and the static confidence maps
//! - [`sheets`] - Google Sheets source client and worksheet schema
//! - [`models`] - Core data structures and types
//! - [`analytics`] - Period extraction, alignment, deltas, confidence windows
//! - [`cache`] - Time-boxed dataset snapshot cache
//! - [`present`] - Chart/table payload builders
//! - [`report`] - Gemini narrative-report client
//! - [`server`] - Dashboard JSON API
//!
//! # Example
//!
//! ```no_run
//! use ital::analytics::{self, ComparisonInput};
//! use ital::config::ConfidenceConfig;
//! use ital::models::{Granularity, MetricTable};
//!
//! fn run(table: &MetricTable) -> anyhow::Result<()> {
//!     let input = ComparisonInput {
//!         metric: "결제".to_string(),
//!         year1: 2024,
//!         year2: 2025,
//!     };
//!     let comparison = analytics::compare(table, &input, &ConfidenceConfig::default())?;
//!     println!("aligned rows: {}", comparison.pair.len());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod present;
pub mod report;
pub mod server;
pub mod sheets;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{compare, Comparison, ComparisonInput};
    pub use crate::config::{ConfidenceConfig, Config};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        AlignedPair, ConfidenceWindow, DeltaRow, DeltaSplit, Granularity, MetricRow, MetricTable,
    };
    pub use crate::sheets::{SheetSchema, SheetSource, SheetTable, SheetsClient};
}

// Direct re-exports for convenience
pub use models::{AlignedPair, DeltaRow, DeltaSplit, Granularity, MetricRow, MetricTable};
