//! Passing–Bablok robust linear regression.
//!
//! The slope is the median of all pairwise slopes after discarding as
//! many of the smallest slopes as there are pairs steeper than -1. The
//! companion bounds are order statistics of the same slope list picked
//! with a rank-based confidence index.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::descriptive::{mean, median_sorted};

/// Confidence level used for the slope bounds.
const CONFIDENCE: f64 = 0.95;

/// Result of a Passing–Bablok fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassingBablokFit {
    /// Median of the retained pairwise slopes.
    pub slope: f64,
    /// Mean of `y - slope * x` over all points.
    pub intercept: f64,
    /// Upper order statistic of the retained slopes.
    pub slope_upper: f64,
    /// Lower order statistic of the retained slopes.
    pub slope_lower: f64,
    /// Number of slopes retained after the shift.
    pub slope_count: usize,
    /// Number of slopes below -1 that were shifted off the low end.
    pub shift: usize,
}

/// Reasons a fit cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// `x` and `y` differ in length.
    LengthMismatch { x: usize, y: usize },
    /// Fewer than two points supplied.
    TooFewPoints { n: usize },
    /// Fewer than two usable pairwise slopes after filtering.
    TooFewSlopes { count: usize },
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::LengthMismatch { x, y } => {
                write!(f, "x and y lengths differ ({} vs {})", x, y)
            }
            FitError::TooFewPoints { n } => {
                write!(f, "need at least 2 points for regression, got {}", n)
            }
            FitError::TooFewSlopes { count } => {
                write!(f, "need at least 2 usable pairwise slopes, got {}", count)
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Fit `y ≈ slope * x + intercept` with the Passing–Bablok estimator.
///
/// Pairs with equal `x` or any NaN coordinate are skipped. Bound indices
/// that fall outside the slope list are clamped to its ends.
pub fn passing_bablok(x: &[f64], y: &[f64]) -> Result<PassingBablokFit, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(FitError::TooFewPoints { n });
    }

    let mut slopes = Vec::with_capacity(n * (n - 1) / 2);
    let mut shift = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if x[i].is_nan() || x[j].is_nan() || y[i].is_nan() || y[j].is_nan() {
                continue;
            }
            let dx = x[i] - x[j];
            if dx == 0.0 {
                continue;
            }
            let slope = (y[i] - y[j]) / dx;
            if slope < -1.0 {
                shift += 1;
            }
            slopes.push(slope);
        }
    }

    slopes.sort_by(f64::total_cmp);
    slopes.drain(..shift.min(slopes.len()));

    let count = slopes.len();
    if count < 2 {
        return Err(FitError::TooFewSlopes { count });
    }

    let slope = median_sorted(&slopes);
    let residuals: Vec<f64> = x.iter().zip(y).map(|(xi, yi)| yi - xi * slope).collect();
    let intercept = mean(&residuals);

    let (lower_idx, upper_idx) = bound_indices(n, count);

    Ok(PassingBablokFit {
        slope,
        intercept,
        slope_upper: slopes[upper_idx],
        slope_lower: slopes[lower_idx],
        slope_count: count,
        shift,
    })
}

/// Rank indices `(m1, m2)` of the lower and upper slope bounds.
fn bound_indices(n: usize, count: usize) -> (usize, usize) {
    let nf = n as f64;
    let c_alpha = (1.0 - CONFIDENCE / 2.0) * (nf * (nf - 1.0) * (2.0 * nf + 5.0) / 18.0).sqrt();
    let m1 = ((count as f64 - c_alpha) / 2.0).round_ties_even() as i64;
    let m2 = count as i64 - m1 + 1;
    let last = count as i64 - 1;
    (m1.clamp(0, last) as usize, m2.clamp(0, last) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn recovers_noiseless_line() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let fit = passing_bablok(&x, &y).unwrap();
        assert!(approx_eq(fit.slope, 2.0, 1e-12));
        assert!(approx_eq(fit.intercept, 1.0, 1e-12));
        assert!(approx_eq(fit.slope_upper, 2.0, 1e-12));
        assert!(approx_eq(fit.slope_lower, 2.0, 1e-12));
        assert_eq!(fit.shift, 0);
        assert_eq!(fit.slope_count, 45);
    }

    #[test]
    fn resists_single_outlier() {
        let x: Vec<f64> = (0..12).map(f64::from).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 0.5 * v + 3.0).collect();
        y[6] = 40.0;
        let fit = passing_bablok(&x, &y).unwrap();
        assert!(approx_eq(fit.slope, 0.5, 1e-9), "slope = {}", fit.slope);
    }

    #[test]
    fn steep_negative_slopes_are_shifted() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, -5.0, 1.0];
        // Pair slopes: (0,1) = -5, (0,2) = 0.5, (1,2) = 6
        let fit = passing_bablok(&x, &y).unwrap();
        assert_eq!(fit.shift, 1);
        assert_eq!(fit.slope_count, 2);
        assert!(approx_eq(fit.slope, 3.25, 1e-12));
    }

    #[test]
    fn equal_x_pairs_are_skipped() {
        let x = [1.0, 1.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let fit = passing_bablok(&x, &y).unwrap();
        assert_eq!(fit.slope_count, 5);
    }

    #[test]
    fn nan_pairs_are_skipped() {
        let x = [1.0, f64::NAN, 2.0, 3.0];
        let y = [3.0, 4.0, 5.0, 7.0];
        let fit = passing_bablok(&x, &y).unwrap();
        assert_eq!(fit.slope_count, 3);
    }

    #[test]
    fn too_few_points_fails() {
        assert_eq!(
            passing_bablok(&[1.0], &[2.0]),
            Err(FitError::TooFewPoints { n: 1 })
        );
    }

    #[test]
    fn constant_x_fails() {
        let err = passing_bablok(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, FitError::TooFewSlopes { count: 0 });
    }

    #[test]
    fn length_mismatch_fails() {
        let err = passing_bablok(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { x: 2, y: 1 }));
    }

    #[test]
    fn bound_indices_stay_in_range() {
        for n in 2..40 {
            let count = n * (n - 1) / 2;
            let (lo, hi) = bound_indices(n, count);
            assert!(lo < count && hi < count);
            assert!(lo <= hi);
        }
    }
}
