//! Core math modules.

pub mod beta;
pub mod descriptive;
pub mod passing_bablok;
pub mod stable;
pub mod student_t;
