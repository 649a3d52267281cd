//! mouse_calc common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the mc-* crates:
//! - Source and result identifiers
//! - The error taxonomy with stable codes
//! - Output formats

pub mod error;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::{ResultId, SourceId};
pub use output::OutputFormat;
