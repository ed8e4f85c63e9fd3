//! Unified error handling for the ital crate
//!
//! Every fallible operation in the pipeline funnels into the single [`Error`]
//! enum so the CLI and the HTTP server can apply one handling strategy:
//! recoverable errors become a user-facing notice with empty outputs, the
//! rest abort the current refresh.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ital::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.korean_desc());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (Sheets API, Gemini API, timeout)
    Network,
    /// Metric-cell parsing errors
    Parsing,
    /// Worksheet shape errors (missing or misdeclared columns)
    Shape,
    /// Configuration and validation errors
    Config,
    /// Narrative report generation errors
    Report,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get Korean description for the category
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Network => "네트워크 오류",
            Self::Parsing => "지표 파싱 오류",
            Self::Shape => "데이터 형식 오류",
            Self::Config => "설정 오류",
            Self::Report => "보고서 생성 오류",
            Self::Other => "기타 오류",
        }
    }
}

/// Unified error type for the ital crate
#[derive(Error, Debug)]
pub enum Error {
    /// Required worksheet columns are missing or misdeclared
    #[error("Worksheet shape mismatch: missing columns {missing:?} in '{worksheet}'")]
    DataShape {
        worksheet: String,
        missing: Vec<String>,
    },

    /// A metric or volume cell is not a valid numeric string
    #[error("Invalid value '{value}' in column '{column}'")]
    Parse { column: String, value: String },

    /// HTTP client errors (Sheets API, Gemini API)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Narrative report generation errors
    #[error("Report error: {0}")]
    Report(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Check if this error is recoverable at the presentation boundary
    ///
    /// Recoverable errors surface as a notice with empty outputs; the
    /// process keeps serving.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DataShape { .. } => true,
            Self::Parse { .. } => true,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Json(_) => false,
            Self::Io(_) => true,
            Self::Config(_) => false,
            Self::Report(_) => true,
            Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DataShape { .. } => ErrorCategory::Shape,
            Self::Parse { .. } => ErrorCategory::Parsing,
            Self::Http(_) => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Io(_) => ErrorCategory::Other,
            Self::Config(_) => ErrorCategory::Config,
            Self::Report(_) => ErrorCategory::Report,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Get Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::DataShape { worksheet, missing } => format!(
                "'{worksheet}' 시트에서 필수 컬럼을 찾을 수 없습니다: {}",
                missing.join(", ")
            ),
            Self::Parse { column, value } => {
                format!("'{column}' 컬럼의 값 '{value}'을(를) 숫자로 해석할 수 없습니다")
            }
            Self::Http(e) => format!("네트워크 오류: {e}"),
            Self::Json(e) => format!("JSON 오류: {e}"),
            Self::Io(e) => format!("입출력 오류: {e}"),
            Self::Config(msg) => format!("설정 오류: {msg}"),
            Self::Report(msg) => format!("보고서 생성 오류: {msg}"),
            Self::Other { context, .. } => context.clone(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a report-generation error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let shape_err = Error::DataShape {
            worksheet: "주간".to_string(),
            missing: vec!["시작일".to_string()],
        };
        assert_eq!(shape_err.category(), ErrorCategory::Shape);

        let parse_err = Error::Parse {
            column: "결제".to_string(),
            value: "N/A".to_string(),
        };
        assert_eq!(parse_err.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_is_recoverable() {
        let shape_err = Error::DataShape {
            worksheet: "주간".to_string(),
            missing: vec![],
        };
        assert!(shape_err.is_recoverable());

        let config_err = Error::config("missing API key");
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_korean_desc() {
        let parse_err = Error::Parse {
            column: "결제".to_string(),
            value: "N/A".to_string(),
        };
        let desc = parse_err.korean_desc();
        assert!(desc.contains("결제"));
        assert!(desc.contains("N/A"));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("Invalid API key");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
    }

    #[test]
    fn test_category_korean() {
        assert_eq!(ErrorCategory::Network.korean_desc(), "네트워크 오류");
        assert_eq!(ErrorCategory::Shape.korean_desc(), "데이터 형식 오류");
    }
}
