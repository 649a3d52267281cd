//! Descriptive statistics over sample slices.
//!
//! All reductions skip NaN cells, so a column with gaps aggregates over
//! its observed values only. Reductions with too few observed values
//! return NaN instead of failing.

use std::cmp::Ordering;

/// Number of non-NaN values.
pub fn observed_count(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

/// Arithmetic mean of the non-NaN values.
///
/// Returns NaN when no value is observed.
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.iter().filter(|v| !v.is_nan()) {
        sum += v;
        n += 1;
    }
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Sample variance (ddof = 1) of the non-NaN values.
///
/// Returns NaN with fewer than two observed values.
pub fn variance(values: &[f64]) -> f64 {
    let n = observed_count(values);
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - m) * (v - m))
        .sum();
    ss / (n as f64 - 1.0)
}

/// Sample standard deviation (ddof = 1) of the non-NaN values.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median of the non-NaN values; even counts average the middle pair.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    median_sorted(&sorted)
}

/// Median of an already sorted, NaN-free slice.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}
