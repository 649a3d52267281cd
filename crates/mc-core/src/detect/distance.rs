//! Distance distribution detector.
//!
//! Within every time-of-day bucket, each target day's per-sample
//! distances are compared with the pooled baseline distances of the same
//! bucket using Welch's t-test. Small p-values raise the error score by
//! `-0.1 * log10(p)`; anything else decays it by one point.

use chrono::NaiveDateTime;
use mc_common::Result;
use mc_config::{DetectorOptions, DistanceOptions};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::{day_buckets, restrict, ErrorSeries, ScoreState, ERROR_VALUE, WELCH_P_VALUE};
use crate::columns::{DISTANCE, TIME};
use crate::logging::{event_names, Stage};
use crate::table::TimeSeriesTable;
use crate::window;

const DECAY: f64 = 1.0;

/// Result of a distance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceReport {
    pub error: ErrorSeries,
    /// One p-value per non-empty (bucket, target day), at the group's mean time.
    pub p_values: ErrorSeries,
    /// Window-aggregated input at `step_size` rows per window.
    pub windowed: TimeSeriesTable,
}

pub fn detect(table: &TimeSeriesTable, options: &DistanceOptions) -> Result<DistanceReport> {
    options.validate()?;
    let windowed = window::aggregate(table, options.step_size() as usize)?;
    let bg = restrict(table, options.baseline())?;
    let tg = restrict(table, options.target())?;
    let days: Vec<(NaiveDateTime, NaiveDateTime)> = options.target().day_windows().collect();
    debug!(
        event = event_names::DETECT_STARTED,
        stage = %Stage::Detect,
        kind = "distance",
        baseline_rows = bg.len(),
        target_rows = tg.len(),
        target_days = days.len(),
        "distance detector started"
    );

    let mut p_values = ErrorSeries::new(WELCH_P_VALUE);
    for (start, end) in day_buckets(options.step_size()) {
        let bg_bucket = bg.between_time_of_day(TIME, start, end)?;
        let reference = bg_bucket.floats(DISTANCE)?;
        let tg_bucket = tg.between_time_of_day(TIME, start, end)?;
        let times = tg_bucket.times(TIME)?;

        for (day_start, day_end) in &days {
            let group = tg_bucket.query(|row| {
                let t = times[row.index()];
                *day_start <= t && t < *day_end
            });
            let Some(time) = group.time_mean(TIME)? else {
                continue;
            };
            let test = mc_math::welch_t_test(group.floats(DISTANCE)?, reference);
            trace!(event = event_names::DETECT_BUCKET, bucket = %start, day = %day_start, rows = group.len(), p = test.p_value, "welch group");
            p_values.push(time, test.p_value);
        }
    }
    p_values.sort_by_time();

    let error = accumulate(&p_values, options.welch_thres);
    info!(
        event = event_names::DETECT_FINISHED,
        stage = %Stage::Detect,
        kind = "distance",
        points = error.len(),
        anomalous = error.anomalous_count(),
        windows = windowed.len(),
        "distance detector finished"
    );
    Ok(DistanceReport {
        error,
        p_values,
        windowed,
    })
}

/// Fold p-values into the cumulative error series.
///
/// `p < threshold` adds `-0.1 * log10(p)`; otherwise, NaN included, the
/// score drops by 1 down to zero.
pub fn accumulate(p_values: &ErrorSeries, threshold: f64) -> ErrorSeries {
    let mut state = ScoreState::default();
    let mut error = ErrorSeries::new(ERROR_VALUE);
    for point in &p_values.points {
        if point.value < threshold {
            state.escalate(-0.1 * point.value.log10());
        } else {
            state.decay(DECAY);
        }
        error.push(point.time, state.error_value);
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> ErrorSeries {
        let t0 = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut s = ErrorSeries::new(WELCH_P_VALUE);
        for (i, v) in values.iter().enumerate() {
            s.push(t0 + Duration::hours(i as i64), *v);
        }
        s
    }

    #[test]
    fn small_p_escalates_by_log() {
        let error = accumulate(&series(&[0.01, 0.001]), 0.5);
        let values = error.values();
        assert!((values[0] - 0.2).abs() < 1e-12);
        assert!((values[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn large_p_decays_by_one() {
        let error = accumulate(&series(&[1e-10, 0.9, 0.5, 1.0]), 0.5);
        let values = error.values();
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!(values[1].abs() < 1e-12);
        assert_eq!(values[2], 0.0);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn nan_p_value_decays() {
        let error = accumulate(&series(&[0.001, f64::NAN]), 0.5);
        assert_eq!(error.values()[1], 0.0);
    }

    #[test]
    fn zero_p_value_is_infinite() {
        let error = accumulate(&series(&[0.0]), 0.5);
        assert!(error.values()[0].is_infinite());
    }
}
