//! Event vocabulary: levels, pipeline stages, event names and the
//! per-run correlation context.

use serde::{Deserialize, Serialize};

/// Level as written in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stage that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Ingest,
    Window,
    Detect,
    Store,
    Report,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Window => "window",
            Stage::Detect => "detect",
            Stage::Store => "store",
            Stage::Report => "report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable `event` field values, `<stage>.<what>`.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INGEST_LOADED: &str = "ingest.loaded";
    pub const INGEST_DISTANCE: &str = "ingest.distance";

    pub const WINDOW_AGGREGATED: &str = "window.aggregated";

    pub const DETECT_STARTED: &str = "detect.started";
    pub const DETECT_BUCKET: &str = "detect.bucket";
    pub const DETECT_FIT: &str = "detect.fit";
    pub const DETECT_FINISHED: &str = "detect.finished";
    pub const DETECT_FAILED: &str = "detect.failed";

    pub const STORE_SOURCE_REGISTERED: &str = "store.source_registered";
    pub const STORE_RESULT_APPENDED: &str = "store.result_appended";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation ids shared by every event of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
    pub source_id: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            source_id: None,
        }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Span carrying the ids; events inside it inherit them in JSONL output.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            source_id = self.source_id.as_deref()
        )
    }
}
