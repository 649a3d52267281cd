//! Temperature versus activity correlation detector.
//!
//! On the window-aggregated table, baseline windows are fitted with a
//! Passing–Bablok line of mean max temperature against log2 of mean
//! distance. A band of `sd_num` standard deviations of the perpendicular
//! residuals around that line defines normal behavior. Target windows
//! outside the band add their perpendicular distance to the band edge to
//! the error; inside the band the error holds for `error_step` windows
//! and then resets to zero.

use chrono::NaiveDateTime;
use mc_common::{Error, Result};
use mc_config::{CorrelationOptions, DetectorOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{restrict, ErrorSeries, ScoreState, COR_ERROR_VALUE};
use crate::columns::{mean_of, DISTANCE, MAX_TEMPERATURE, TIME};
use crate::logging::{event_names, Stage};
use crate::table::TimeSeriesTable;
use crate::window;

/// Baseline fit and band edges.
///
/// `slope_upper`/`slope_lower` are the regression's slope bounds and are
/// informational only; the band uses `upper_intercept`/`lower_intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFit {
    pub slope: f64,
    pub intercept: f64,
    pub upper_intercept: f64,
    pub lower_intercept: f64,
    pub slope_upper: f64,
    pub slope_lower: f64,
}

impl CorrelationFit {
    /// `sqrt(1 + slope^2)`, converting vertical offsets to perpendicular ones.
    pub fn norm(&self) -> f64 {
        (1.0 + self.slope * self.slope).sqrt()
    }

    pub fn upper_at(&self, x: f64) -> f64 {
        x * self.slope + self.upper_intercept
    }

    pub fn lower_at(&self, x: f64) -> f64 {
        x * self.slope + self.lower_intercept
    }
}

/// Result of a correlation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub error: ErrorSeries,
    pub fit: CorrelationFit,
}

/// log2 of a mean distance; zero distance maps to `1 / step_size`.
pub fn activity(distance_mean: f64, step_size: u32) -> f64 {
    let x = distance_mean.log2();
    if x == f64::NEG_INFINITY {
        1.0 / step_size as f64
    } else {
        x
    }
}

pub fn detect(table: &TimeSeriesTable, options: &CorrelationOptions) -> Result<CorrelationReport> {
    options.validate()?;
    let step = options.step_size();
    let windowed = window::aggregate(table, step as usize)?;
    let bg = restrict(&windowed, options.baseline())?;
    let tg = restrict(&windowed, options.target())?;

    let (_, bg_x, bg_y) = points(&bg, step)?;
    let fit = fit_band(&bg_x, &bg_y, options.sd_num)?;
    debug!(
        event = event_names::DETECT_FIT,
        stage = %Stage::Detect,
        kind = "cor",
        baseline_windows = bg.len(),
        slope = fit.slope,
        intercept = fit.intercept,
        upper_intercept = fit.upper_intercept,
        lower_intercept = fit.lower_intercept,
        "baseline band fitted"
    );

    let (times, tg_x, tg_y) = points(&tg, step)?;
    let mut error = accumulate(
        times.into_iter().zip(tg_x).zip(tg_y).map(|((t, x), y)| (t, x, y)),
        &fit,
        options.error_step,
    );
    error.sort_by_time();

    info!(
        event = event_names::DETECT_FINISHED,
        stage = %Stage::Detect,
        kind = "cor",
        points = error.len(),
        anomalous = error.anomalous_count(),
        "correlation detector finished"
    );
    Ok(CorrelationReport { error, fit })
}

fn points(windowed: &TimeSeriesTable, step: u32) -> Result<(Vec<NaiveDateTime>, Vec<f64>, Vec<f64>)> {
    let times = windowed.times(TIME)?.to_vec();
    let x = windowed
        .floats(&mean_of(DISTANCE))?
        .iter()
        .map(|d| activity(*d, step))
        .collect();
    let y = windowed.floats(&mean_of(MAX_TEMPERATURE))?.to_vec();
    Ok((times, x, y))
}

/// Fit the baseline line and the residual band around it.
pub fn fit_band(x: &[f64], y: &[f64], sd_num: f64) -> Result<CorrelationFit> {
    let pb = mc_math::passing_bablok(x, y).map_err(|e| Error::InsufficientData(e.to_string()))?;
    let norm = (1.0 + pb.slope * pb.slope).sqrt();
    let side: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(x, y)| (y - (x * pb.slope + pb.intercept)) / norm)
        .collect();
    let half_width = mc_math::std_dev(&side) * sd_num;

    Ok(CorrelationFit {
        slope: pb.slope,
        intercept: pb.intercept,
        upper_intercept: pb.intercept + half_width * norm,
        lower_intercept: pb.intercept - half_width * norm,
        slope_upper: pb.slope_upper,
        slope_lower: pb.slope_lower,
    })
}

/// Fold `(time, x, y)` target points through the band state machine.
///
/// Points strictly above or below the band add their perpendicular
/// distance to the crossed edge and restart the grace counter. A point
/// inside the band (edges included) resets the score once the counter
/// exceeds `error_step`, otherwise it only advances the counter.
pub fn accumulate<I>(samples: I, fit: &CorrelationFit, error_step: u32) -> ErrorSeries
where
    I: IntoIterator<Item = (NaiveDateTime, f64, f64)>,
{
    let norm = fit.norm();
    let mut state = ScoreState::default();
    let mut error = ErrorSeries::new(COR_ERROR_VALUE);
    for (time, x, y) in samples {
        let upper = fit.upper_at(x);
        let lower = fit.lower_at(x);
        if y > upper {
            state.escalate((y - upper).abs() / norm);
            state.grace_counter = 0;
        } else if y < lower {
            state.escalate((y - lower).abs() / norm);
            state.grace_counter = 0;
        } else if state.grace_counter > error_step {
            state.reset();
        } else {
            state.grace_counter += 1;
        }
        error.push(time, state.error_value);
    }
    error
}
