//! Anomaly detectors and their shared result types.
//!
//! All three detectors read an immutable sample table, restrict it to a
//! baseline and a target range, and fold a per-sample score into a
//! cumulative error series sorted by time.

pub mod correlation;
pub mod distance;
pub mod temperature;

use chrono::{NaiveDateTime, NaiveTime};
use mc_common::Result;
use mc_config::{AnalysisConfig, TimeRange};
use serde::{Deserialize, Serialize};

use crate::columns::{MAX_TEMPERATURE, MIN_TEMPERATURE, TIME};
use crate::table::{Column, TimeSeriesTable};

pub use correlation::{CorrelationFit, CorrelationReport};
pub use distance::DistanceReport;
pub use temperature::TemperatureReport;

/// Value column of the temperature series, raw and accumulated.
pub const TEMPERATURE_ERROR_DATA: &str = "temperature_error_data";
/// Value column of the accumulated distance series.
pub const ERROR_VALUE: &str = "error_value";
/// Value column of the per-day Welch p-values.
pub const WELCH_P_VALUE: &str = "welch_p_value";
/// Value column of the accumulated correlation series.
pub const COR_ERROR_VALUE: &str = "cor_error_value";

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Kind of detector result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    MaxTemperature,
    MinTemperature,
    Distance,
    #[serde(rename = "cor")]
    Correlation,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::MaxTemperature,
        DetectorKind::MinTemperature,
        DetectorKind::Distance,
        DetectorKind::Correlation,
    ];

    /// Label of the accumulated error column for this kind.
    pub fn value_column(&self) -> &'static str {
        match self {
            DetectorKind::MaxTemperature | DetectorKind::MinTemperature => TEMPERATURE_ERROR_DATA,
            DetectorKind::Distance => ERROR_VALUE,
            DetectorKind::Correlation => COR_ERROR_VALUE,
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DetectorKind::MaxTemperature => "max_temperature",
            DetectorKind::MinTemperature => "min_temperature",
            DetectorKind::Distance => "distance",
            DetectorKind::Correlation => "cor",
        };
        write!(f, "{}", s)
    }
}

/// Which temperature signal the temperature detector scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureChannel {
    #[default]
    Max,
    Min,
}

impl TemperatureChannel {
    pub fn column(&self) -> &'static str {
        match self {
            TemperatureChannel::Max => MAX_TEMPERATURE,
            TemperatureChannel::Min => MIN_TEMPERATURE,
        }
    }

    pub fn kind(&self) -> DetectorKind {
        match self {
            TemperatureChannel::Max => DetectorKind::MaxTemperature,
            TemperatureChannel::Min => DetectorKind::MinTemperature,
        }
    }
}

/// One `(time, value)` sample of a result series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorPoint {
    #[serde(with = "mc_config::time::serde_format")]
    pub time: NaiveDateTime,
    pub value: f64,
}

/// A labeled `(time, value)` series in ascending time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSeries {
    /// Name of the value column.
    pub label: String,
    pub points: Vec<ErrorPoint>,
}

impl ErrorSeries {
    pub fn new(label: impl Into<String>) -> Self {
        ErrorSeries {
            label: label.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, time: NaiveDateTime, value: f64) {
        self.points.push(ErrorPoint { time, value });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stable sort by time.
    pub fn sort_by_time(&mut self) {
        self.points.sort_by_key(|p| p.time);
    }

    pub fn is_sorted_by_time(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Number of points whose value is strictly positive.
    pub fn anomalous_count(&self) -> usize {
        self.points.iter().filter(|p| p.value > 0.0).count()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Two-column table `time`, `<label>`.
    pub fn to_table(&self) -> Result<TimeSeriesTable> {
        TimeSeriesTable::from_columns(vec![
            (
                TIME.to_string(),
                Column::Time(self.points.iter().map(|p| p.time).collect()),
            ),
            (self.label.clone(), Column::Float(self.values())),
        ])
    }
}

/// Running score threaded through the detector folds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreState {
    pub error_value: f64,
    /// Consecutive in-band rows since the last excursion.
    pub grace_counter: u32,
}

impl ScoreState {
    pub fn escalate(&mut self, amount: f64) {
        self.error_value += amount;
    }

    /// Subtract `amount`, never going below zero.
    pub fn decay(&mut self, amount: f64) {
        self.error_value -= amount;
        if self.error_value < 0.0 {
            self.error_value = 0.0;
        }
    }

    pub fn reset(&mut self) {
        *self = ScoreState::default();
    }
}

/// Time-of-day buckets `[start, start + step)` covering one day.
///
/// Buckets start at midnight and partition the clock; a last bucket that
/// would reach past midnight is cut at 24:00.
pub fn day_buckets(step_minutes: u32) -> Vec<(NaiveTime, NaiveTime)> {
    if step_minutes == 0 {
        return Vec::new();
    }
    (0..MINUTES_PER_DAY)
        .step_by(step_minutes as usize)
        .map(|start| (clock(start), clock((start + step_minutes).min(MINUTES_PER_DAY))))
        .collect()
}

fn clock(minutes: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt((minutes % MINUTES_PER_DAY) * 60, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Rows of `table` inside `range`, inclusive.
pub(crate) fn restrict(table: &TimeSeriesTable, range: &TimeRange) -> Result<TimeSeriesTable> {
    table.between(TIME, &range.init, &range.end)
}

/// Output of one detector run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "detector", rename_all = "snake_case")]
pub enum Report {
    Temperature(TemperatureReport),
    Distance(DistanceReport),
    Correlation(CorrelationReport),
}

impl Report {
    pub fn kind(&self) -> DetectorKind {
        match self {
            Report::Temperature(r) => r.channel.kind(),
            Report::Distance(_) => DetectorKind::Distance,
            Report::Correlation(_) => DetectorKind::Correlation,
        }
    }

    /// The accumulated error series.
    pub fn error(&self) -> &ErrorSeries {
        match self {
            Report::Temperature(r) => &r.error,
            Report::Distance(r) => &r.error,
            Report::Correlation(r) => &r.error,
        }
    }

    /// Parameters worth persisting next to the series.
    pub fn params(&self) -> serde_json::Value {
        match self {
            Report::Correlation(r) => serde_json::to_value(r.fit).unwrap_or_default(),
            _ => serde_json::Value::Null,
        }
    }
}

/// Run the detector for `kind` with the matching block of `config`.
pub fn run(kind: DetectorKind, table: &TimeSeriesTable, config: &AnalysisConfig) -> Result<Report> {
    match kind {
        DetectorKind::MaxTemperature => {
            temperature::detect(table, &config.temperature, TemperatureChannel::Max).map(Report::Temperature)
        }
        DetectorKind::MinTemperature => {
            temperature::detect(table, &config.temperature, TemperatureChannel::Min).map(Report::Temperature)
        }
        DetectorKind::Distance => distance::detect(table, &config.distance).map(Report::Distance),
        DetectorKind::Correlation => correlation::detect(table, &config.cor).map(Report::Correlation),
    }
}

/// Options of `kind` as a flat mapping.
pub fn options_for(kind: DetectorKind, config: &AnalysisConfig) -> serde_json::Value {
    use mc_config::DetectorOptions;
    let map = match kind {
        DetectorKind::MaxTemperature | DetectorKind::MinTemperature => config.temperature.to_option_map(),
        DetectorKind::Distance => config.distance.to_option_map(),
        DetectorKind::Correlation => config.cor.to_option_map(),
    };
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_gives_180_buckets() {
        let buckets = day_buckets(8);
        assert_eq!(buckets.len(), 180);
        assert_eq!(buckets[0].0, NaiveTime::MIN);
        assert_eq!(buckets[0].1, NaiveTime::from_hms_opt(0, 8, 0).unwrap());
        assert_eq!(buckets[179].1, NaiveTime::MIN);
    }

    #[test]
    fn whole_day_bucket_wraps() {
        let buckets = day_buckets(1440);
        assert_eq!(buckets, vec![(NaiveTime::MIN, NaiveTime::MIN)]);
    }

    #[test]
    fn uneven_step_cuts_last_bucket_at_midnight() {
        let buckets = day_buckets(7);
        assert_eq!(buckets.len(), 206);
        assert_eq!(buckets[205].0, NaiveTime::from_hms_opt(23, 55, 0).unwrap());
        assert_eq!(buckets[205].1, NaiveTime::MIN);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn score_state_clamps_at_zero() {
        let mut s = ScoreState::default();
        s.escalate(0.3);
        s.decay(0.5);
        assert_eq!(s.error_value, 0.0);
        s.escalate(2.0);
        s.grace_counter = 3;
        s.reset();
        assert_eq!(s, ScoreState::default());
    }

    #[test]
    fn anomalous_count_ignores_zero() {
        let t = NaiveTime::MIN;
        let day = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let mut series = ErrorSeries::new(ERROR_VALUE);
        for (i, v) in [0.0, 0.4, 0.0, 1.2].into_iter().enumerate() {
            series.push(day.and_time(t) + chrono::Duration::minutes(i as i64), v);
        }
        assert_eq!(series.anomalous_count(), 2);
        assert_eq!(series.last_value(), Some(1.2));
        let table = series.to_table().unwrap();
        assert_eq!(table.labels(), &[TIME.to_string(), ERROR_VALUE.to_string()]);
    }

    #[test]
    fn kind_display_and_serde_agree_on_names() {
        assert_eq!(DetectorKind::Correlation.to_string(), "cor");
        assert_eq!(
            serde_json::to_string(&DetectorKind::MinTemperature).unwrap(),
            "\"min_temperature\""
        );
        assert_eq!(TemperatureChannel::Min.kind(), DetectorKind::MinTemperature);
    }
}
