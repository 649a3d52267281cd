//! Synthetic sample files shared by the integration tests.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mc_config::{AnalysisConfig, CorrelationOptions, DistanceOptions, TemperatureOptions, TimeRange};

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Activity level of the hour: 1 through 6 distance units per minute.
pub fn amplitude(minute: usize) -> f64 {
    1.0 + ((minute / 60) % 24 % 6) as f64
}

/// One sample per minute for `days` days.
///
/// The animal paces back and forth with an hourly amplitude and its
/// temperature tracks that activity. On `heat_day` (0-based) the max
/// temperature runs 3 degrees hot.
pub fn sample_csv(days: usize, heat_day: Option<usize>) -> String {
    let mut out = String::new();
    for i in 0..days * 1440 {
        let t = start() + Duration::minutes(i as i64);
        let amp = amplitude(i);
        let x = if i % 2 == 0 { 0.0 } else { amp };
        let wobble = (i % 13) as f64 * 0.01;
        let mut max_t = 36.5 + 0.1 * amp + wobble;
        if heat_day == Some(i / 1440) {
            max_t += 3.0;
        }
        let min_t = 35.0 + wobble;
        writeln!(
            out,
            "{},{:.3},{},{},{:.3},{},{}",
            t.format(mc_config::TIME_FORMAT),
            max_t,
            x,
            0.0,
            min_t,
            x,
            0.0
        )
        .unwrap();
    }
    out
}

/// Same motion as [`sample_csv`] with both temperatures pinned to `celsius`.
pub fn flat_csv(days: usize, celsius: f64) -> String {
    let mut out = String::new();
    for i in 0..days * 1440 {
        let t = start() + Duration::minutes(i as i64);
        let x = if i % 2 == 0 { 0.0 } else { amplitude(i) };
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            t.format(mc_config::TIME_FORMAT),
            celsius,
            x,
            0.0,
            celsius,
            x,
            0.0
        )
        .unwrap();
    }
    out
}

pub fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn config(bg: &str, tg: &str, step_size: u32) -> AnalysisConfig {
    let baseline = TimeRange::parse_date_span(bg).unwrap();
    let target = TimeRange::parse_date_span(tg).unwrap();
    AnalysisConfig {
        temperature: TemperatureOptions {
            baseline,
            target,
            step_size,
            thres_sd_heat: 1.5,
        },
        distance: DistanceOptions {
            baseline,
            target,
            step_size,
            welch_thres: 0.5,
        },
        cor: CorrelationOptions {
            baseline,
            target,
            step_size,
            error_step: 1,
            sd_num: 1.5,
        },
    }
}
