//! mouse_calc core library
//!
//! This library provides the anomaly scoring engine for rodent telemetry:
//! - A labeled, column-oriented time series table
//! - Sample ingestion and preprocessing
//! - Fixed-size window aggregation
//! - Temperature, distance and correlation detectors
//! - Isolated detector dispatch and a shared result store
//! - Exit codes and structured logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod columns;
pub mod detect;
pub mod dispatch;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod preprocess;
pub mod store;
pub mod table;
pub mod window;

pub use detect::{DetectorKind, ErrorPoint, ErrorSeries};
pub use store::ResultStore;
pub use table::TimeSeriesTable;
