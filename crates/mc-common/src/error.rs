//! Error types for mouse_calc.
//!
//! Every error carries a stable numeric code grouped by category so that
//! machine consumers can branch on it without parsing messages.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Timestamp Parse Error
//!   Reason: parse error: row 12: "2021/13/01 00:00:00" is not a valid timestamp
//!   Fix: Time values must use the YYYY/MM/DD HH:MM:SS format.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 10,
//!   "category": "config",
//!   "message": "missing option: welch_thres",
//!   "context": { "key": "welch_thres" }
//! }
//! ```
//!
//! All errors are deterministic: the same input reproduces the same
//! failure, so none of them is retried.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for mouse_calc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Detector options and call arguments.
    Config,
    /// Sample loading and table schema errors.
    Ingest,
    /// Detector and regression failures.
    Analysis,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingest => write!(f, "ingest"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for mouse_calc.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("missing option: {key}")]
    MissingOption { key: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Ingest errors (20-29)
    #[error("parse error: {0}")]
    Parse(String),

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    // Analysis errors (30-39)
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("detector worker failed: {0}")]
    Worker(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingest errors
    /// - 30-39: Analysis errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::MissingOption { .. } => 10,
            Error::InvalidArgument(_) => 11,
            Error::Parse(_) => 20,
            Error::Schema(_) => 21,
            Error::UnknownColumn { .. } => 22,
            Error::InsufficientData(_) => 30,
            Error::Worker(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingOption { .. } | Error::InvalidArgument(_) => ErrorCategory::Config,

            Error::Parse(_) | Error::Schema(_) | Error::UnknownColumn { .. } => {
                ErrorCategory::Ingest
            }

            Error::InsufficientData(_) | Error::Worker(_) => ErrorCategory::Analysis,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::MissingOption { .. } => {
                "Supply every option the detector needs: time ranges, step_size and its threshold keys."
            }
            Error::InvalidArgument(_) => {
                "Check that step sizes are positive and every time range ends at or after its start."
            }
            Error::Parse(_) => "Time values must use the YYYY/MM/DD HH:MM:SS format.",
            Error::Schema(_) => {
                "Rows must have 7 columns: time, max_temperature, max_pos_x, max_pos_y, min_temperature, min_pos_x, min_pos_y."
            }
            Error::UnknownColumn { .. } => "Use one of the table's column labels.",
            Error::InsufficientData(_) => {
                "Widen the baseline range so it covers at least two windows with distinct distances."
            }
            Error::Worker(_) => "A detector worker panicked. Re-run with --log-level debug.",
            Error::Io(_) => "Check that the input file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::MissingOption { .. } => "Missing Option",
            Error::InvalidArgument(_) => "Invalid Argument",
            Error::Parse(_) => "Timestamp Parse Error",
            Error::Schema(_) => "Schema Mismatch",
            Error::UnknownColumn { .. } => "Unknown Column",
            Error::InsufficientData(_) => "Insufficient Data",
            Error::Worker(_) => "Detector Worker Failed",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Additional structured context (e.g., option key, column name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingOption { key } => {
                context.insert("key".to_string(), serde_json::json!(key));
            }
            Error::UnknownColumn { name } => {
                context.insert("column".to_string(), serde_json::json!(name));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
