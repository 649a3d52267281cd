//! mouse_calc detector configuration and validation.
//!
//! This crate provides:
//! - Typed option structs for the temperature, distance and correlation detectors
//! - Decoding from the flat option mappings the detectors are invoked with
//! - Semantic validation at the core boundary

pub mod options;
pub mod time;
pub mod validate;

pub use options::{
    AnalysisConfig, CorrelationOptions, DetectorOptions, DistanceOptions, OptionMap,
    TemperatureOptions, TimeRange,
};
pub use time::{format_time, parse_time, TIME_FORMAT};
pub use validate::{ValidationError, ValidationResult};
