//! Numeric primitives for mouse telemetry analysis.

pub mod math;

pub use math::beta::beta_cdf;
pub use math::descriptive::{mean, median, median_sorted, observed_count, std_dev, variance};
pub use math::passing_bablok::{passing_bablok, FitError, PassingBablokFit};
pub use math::stable::{log_beta, log_gamma};
pub use math::student_t::{student_t_two_sided, welch_t_test, WelchTest};
