//! Option validation errors and semantic validation.

use thiserror::Error;

use crate::options::TimeRange;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Detector option errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Parse error for {key}: {message}")]
    ParseError { key: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    ///
    /// Matches the code of the `mc_common::Error` this converts into.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::MissingOption(_) => 10,
            ValidationError::InvalidValue { .. } => 11,
            ValidationError::ParseError { .. } => 20,
        }
    }
}

impl From<ValidationError> for mc_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingOption(key) => mc_common::Error::MissingOption { key },
            ValidationError::ParseError { key, message } => {
                mc_common::Error::Parse(format!("option {}: {}", key, message))
            }
            ValidationError::InvalidValue { field, message } => {
                mc_common::Error::InvalidArgument(format!("{}: {}", field, message))
            }
        }
    }
}

/// Validate that a time range does not end before it starts.
pub fn validate_time_range(field: &str, range: &TimeRange) -> ValidationResult<()> {
    if range.end < range.init {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!(
                "range ends ({}) before it starts ({})",
                crate::time::format_time(&range.end),
                crate::time::format_time(&range.init)
            ),
        });
    }
    Ok(())
}

/// Validate a time-of-day bucket width in minutes.
pub fn validate_step_size(step_size: u32) -> ValidationResult<()> {
    if step_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "step_size".to_string(),
            message: "Must be positive, got 0".to_string(),
        });
    }
    Ok(())
}

/// Validate a finite, strictly positive threshold.
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be finite and positive, got {}", value),
        });
    }
    Ok(())
}

/// Validate a finite, non-negative multiplier.
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be finite and non-negative, got {}", value),
        });
    }
    Ok(())
}
