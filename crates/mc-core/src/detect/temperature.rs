//! Temperature deviation detector.
//!
//! For each time-of-day bucket the baseline mean and standard deviation
//! of the chosen temperature column are pooled across baseline days.
//! Every baseline and target sample in the bucket is scored as
//! `|t - mean| / std`; the scores are sorted by time and folded into a
//! leaky-bucket error value.

use mc_common::Result;
use mc_config::{DetectorOptions, TemperatureOptions};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::{day_buckets, restrict, ErrorSeries, ScoreState, TemperatureChannel, TEMPERATURE_ERROR_DATA};
use crate::columns::TIME;
use crate::logging::{event_names, Stage};
use crate::table::TimeSeriesTable;

/// Escalation per threshold multiple.
const ESCALATION: f64 = 0.1;
/// Decay for an in-threshold sample.
const DECAY: f64 = 0.5;

/// Result of a temperature run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReport {
    pub channel: TemperatureChannel,
    /// Accumulated error.
    pub error: ErrorSeries,
    /// Per-sample deviation in baseline standard deviations, sorted by time.
    pub deviations: ErrorSeries,
}

/// Score `table` against its baseline on the given temperature channel.
pub fn detect(
    table: &TimeSeriesTable,
    options: &TemperatureOptions,
    channel: TemperatureChannel,
) -> Result<TemperatureReport> {
    options.validate()?;
    let column = channel.column();
    let bg = restrict(table, options.baseline())?;
    let tg = restrict(table, options.target())?;
    debug!(
        event = event_names::DETECT_STARTED,
        stage = %Stage::Detect,
        kind = %channel.kind(),
        baseline_rows = bg.len(),
        target_rows = tg.len(),
        "temperature detector started"
    );

    let mut deviations = ErrorSeries::new(TEMPERATURE_ERROR_DATA);
    for (start, end) in day_buckets(options.step_size()) {
        let bg_bucket = bg.between_time_of_day(TIME, start, end)?;
        let reference = bg_bucket.floats(column)?;
        let mean = mc_math::mean(reference);
        let std = mc_math::std_dev(reference);
        trace!(event = event_names::DETECT_BUCKET, bucket = %start, mean, std, rows = bg_bucket.len(), "baseline bucket");

        let tg_bucket = tg.between_time_of_day(TIME, start, end)?;
        for bucket in [&bg_bucket, &tg_bucket] {
            let times = bucket.times(TIME)?;
            let values = bucket.floats(column)?;
            for (time, value) in times.iter().zip(values) {
                deviations.push(*time, (value - mean).abs() / std);
            }
        }
    }
    deviations.sort_by_time();

    let error = accumulate(&deviations, options.thres_sd_heat);
    info!(
        event = event_names::DETECT_FINISHED,
        stage = %Stage::Detect,
        kind = %channel.kind(),
        points = error.len(),
        anomalous = error.anomalous_count(),
        "temperature detector finished"
    );
    Ok(TemperatureReport {
        channel,
        error,
        deviations,
    })
}

/// Fold deviations into the cumulative error series.
///
/// Deviations above `threshold` add `deviation / threshold * 0.1`; any
/// other value, NaN included, decays the score by 0.5 down to zero.
pub fn accumulate(deviations: &ErrorSeries, threshold: f64) -> ErrorSeries {
    let mut state = ScoreState::default();
    let mut error = ErrorSeries::new(TEMPERATURE_ERROR_DATA);
    for point in &deviations.points {
        if point.value > threshold {
            state.escalate(point.value / threshold * ESCALATION);
        } else {
            state.decay(DECAY);
        }
        error.push(point.time, state.error_value);
    }
    error
}
