//! Typed detector options.
//!
//! Detectors are invoked with flat option mappings keyed by
//! `bg_time_init`, `bg_time_end`, `tg_time_init`, `tg_time_end`,
//! `step_size` and one or two detector-specific keys. Every key is
//! required; nothing here supplies defaults.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::time::{format_time, parse_time};
use crate::validate::{
    validate_non_negative, validate_positive, validate_step_size, validate_time_range,
    ValidationError, ValidationResult,
};

/// Flat option mapping as handed to a detector.
pub type OptionMap = Map<String, Value>;

pub const BG_TIME_INIT: &str = "bg_time_init";
pub const BG_TIME_END: &str = "bg_time_end";
pub const TG_TIME_INIT: &str = "tg_time_init";
pub const TG_TIME_END: &str = "tg_time_end";
pub const STEP_SIZE: &str = "step_size";
pub const THRES_SD_HEAT: &str = "thres_sd_heat";
pub const WELCH_THRES: &str = "welch_thres";
pub const ERROR_STEP: &str = "error_step";
pub const SD_NUM: &str = "sd_num";

/// Closed time interval `[init, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "crate::time::serde_format")]
    pub init: NaiveDateTime,
    #[serde(with = "crate::time::serde_format")]
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(init: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimeRange { init, end }
    }

    /// Parse a `YYYY/MM/DD-YYYY/MM/DD` span; both dates resolve to midnight.
    pub fn parse_date_span(text: &str) -> ValidationResult<Self> {
        let (init, end) = text
            .split_once('-')
            .ok_or_else(|| ValidationError::ParseError {
                key: "time range".to_string(),
                message: format!("{:?} is not of the form YYYY/MM/DD-YYYY/MM/DD", text),
            })?;
        Ok(TimeRange {
            init: parse_time("time range start", init)?,
            end: parse_time("time range end", end)?,
        })
    }

    /// Inclusive on both ends.
    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.init <= *t && *t <= self.end
    }

    /// Consecutive one-day windows `[init + i days, init + (i+1) days)`.
    ///
    /// There are `whole days between init and end + 1` windows, so the
    /// last window may run past `end`.
    pub fn day_windows(&self) -> impl Iterator<Item = (NaiveDateTime, NaiveDateTime)> + '_ {
        let days = (self.end - self.init).num_days().max(0) + 1;
        (0..days).map(move |i| {
            let start = self.init + Duration::days(i);
            (start, start + Duration::days(1))
        })
    }
}

/// Accessors shared by every detector's options.
pub trait DetectorOptions {
    /// Reference range assumed free of anomalies.
    fn baseline(&self) -> &TimeRange;
    /// Range scored against the baseline.
    fn target(&self) -> &TimeRange;
    /// Time-of-day bucket width in minutes, also the window size in rows.
    fn step_size(&self) -> u32;
    /// Semantic validation.
    fn validate(&self) -> ValidationResult<()>;
    /// Flat option mapping with the documented key names.
    fn to_option_map(&self) -> OptionMap;
}

/// Options for the temperature deviation detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionMap", into = "OptionMap")]
pub struct TemperatureOptions {
    pub baseline: TimeRange,
    pub target: TimeRange,
    pub step_size: u32,
    /// Deviation threshold in baseline standard deviations.
    pub thres_sd_heat: f64,
}

impl TemperatureOptions {
    pub fn from_option_map(map: &OptionMap) -> ValidationResult<Self> {
        let (baseline, target) = decode_ranges(map)?;
        Ok(TemperatureOptions {
            baseline,
            target,
            step_size: step_option(map)?,
            thres_sd_heat: float_option(map, THRES_SD_HEAT)?,
        })
    }
}

impl DetectorOptions for TemperatureOptions {
    fn baseline(&self) -> &TimeRange {
        &self.baseline
    }

    fn target(&self) -> &TimeRange {
        &self.target
    }

    fn step_size(&self) -> u32 {
        self.step_size
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_common(self)?;
        validate_positive(THRES_SD_HEAT, self.thres_sd_heat)
    }

    fn to_option_map(&self) -> OptionMap {
        let mut map = encode_common(self);
        map.insert(THRES_SD_HEAT.to_string(), Value::from(self.thres_sd_heat));
        map
    }
}

/// Options for the Welch-test distance detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionMap", into = "OptionMap")]
pub struct DistanceOptions {
    pub baseline: TimeRange,
    pub target: TimeRange,
    pub step_size: u32,
    /// p-value below which a bucket counts as anomalous.
    pub welch_thres: f64,
}

impl DistanceOptions {
    pub fn from_option_map(map: &OptionMap) -> ValidationResult<Self> {
        let (baseline, target) = decode_ranges(map)?;
        Ok(DistanceOptions {
            baseline,
            target,
            step_size: step_option(map)?,
            welch_thres: float_option(map, WELCH_THRES)?,
        })
    }
}

impl DetectorOptions for DistanceOptions {
    fn baseline(&self) -> &TimeRange {
        &self.baseline
    }

    fn target(&self) -> &TimeRange {
        &self.target
    }

    fn step_size(&self) -> u32 {
        self.step_size
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_common(self)?;
        validate_positive(WELCH_THRES, self.welch_thres)
    }

    fn to_option_map(&self) -> OptionMap {
        let mut map = encode_common(self);
        map.insert(WELCH_THRES.to_string(), Value::from(self.welch_thres));
        map
    }
}

/// Options for the temperature/activity correlation detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionMap", into = "OptionMap")]
pub struct CorrelationOptions {
    pub baseline: TimeRange,
    pub target: TimeRange,
    pub step_size: u32,
    /// In-band rows tolerated before the error resets.
    pub error_step: u32,
    /// Band half-width in residual standard deviations.
    pub sd_num: f64,
}

impl CorrelationOptions {
    pub fn from_option_map(map: &OptionMap) -> ValidationResult<Self> {
        let (baseline, target) = decode_ranges(map)?;
        Ok(CorrelationOptions {
            baseline,
            target,
            step_size: step_option(map)?,
            error_step: count_option(map, ERROR_STEP)?,
            sd_num: float_option(map, SD_NUM)?,
        })
    }
}

impl DetectorOptions for CorrelationOptions {
    fn baseline(&self) -> &TimeRange {
        &self.baseline
    }

    fn target(&self) -> &TimeRange {
        &self.target
    }

    fn step_size(&self) -> u32 {
        self.step_size
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_common(self)?;
        validate_non_negative(SD_NUM, self.sd_num)
    }

    fn to_option_map(&self) -> OptionMap {
        let mut map = encode_common(self);
        map.insert(ERROR_STEP.to_string(), Value::from(self.error_step));
        map.insert(SD_NUM.to_string(), Value::from(self.sd_num));
        map
    }
}

/// Options for a full analysis run, one block per detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub temperature: TemperatureOptions,
    pub distance: DistanceOptions,
    pub cor: CorrelationOptions,
}

impl AnalysisConfig {
    /// Validate every detector block.
    pub fn validate(&self) -> ValidationResult<()> {
        self.temperature.validate()?;
        self.distance.validate()?;
        self.cor.validate()
    }
}

macro_rules! option_map_conversions {
    ($($ty:ty),*) => {$(
        impl TryFrom<OptionMap> for $ty {
            type Error = ValidationError;

            fn try_from(map: OptionMap) -> ValidationResult<Self> {
                Self::from_option_map(&map)
            }
        }

        impl From<$ty> for OptionMap {
            fn from(options: $ty) -> Self {
                options.to_option_map()
            }
        }
    )*};
}

option_map_conversions!(TemperatureOptions, DistanceOptions, CorrelationOptions);

fn validate_common<O: DetectorOptions + ?Sized>(options: &O) -> ValidationResult<()> {
    validate_time_range("baseline", options.baseline())?;
    validate_time_range("target", options.target())?;
    validate_step_size(options.step_size())
}

fn encode_common<O: DetectorOptions + ?Sized>(options: &O) -> OptionMap {
    let mut map = OptionMap::new();
    let baseline = options.baseline();
    let target = options.target();
    map.insert(BG_TIME_INIT.to_string(), Value::from(format_time(&baseline.init)));
    map.insert(BG_TIME_END.to_string(), Value::from(format_time(&baseline.end)));
    map.insert(TG_TIME_INIT.to_string(), Value::from(format_time(&target.init)));
    map.insert(TG_TIME_END.to_string(), Value::from(format_time(&target.end)));
    map.insert(STEP_SIZE.to_string(), Value::from(options.step_size()));
    map
}

fn decode_ranges(map: &OptionMap) -> ValidationResult<(TimeRange, TimeRange)> {
    let baseline = TimeRange::new(time_option(map, BG_TIME_INIT)?, time_option(map, BG_TIME_END)?);
    let target = TimeRange::new(time_option(map, TG_TIME_INIT)?, time_option(map, TG_TIME_END)?);
    Ok((baseline, target))
}

fn required<'a>(map: &'a OptionMap, key: &str) -> ValidationResult<&'a Value> {
    match map.get(key) {
        Some(Value::Null) | None => Err(ValidationError::MissingOption(key.to_string())),
        Some(value) => Ok(value),
    }
}

fn type_error(key: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::ParseError {
        key: key.to_string(),
        message: format!("expected {}, got {}", expected, value),
    }
}

fn time_option(map: &OptionMap, key: &str) -> ValidationResult<NaiveDateTime> {
    match required(map, key)? {
        Value::String(text) => parse_time(key, text),
        other => Err(type_error(key, "a timestamp string", other)),
    }
}

fn float_option(map: &OptionMap, key: &str) -> ValidationResult<f64> {
    let value = required(map, key)?;
    value
        .as_f64()
        .ok_or_else(|| type_error(key, "a number", value))
}

/// Non-negative integer option; integral floats such as `8.0` are accepted.
fn count_option(map: &OptionMap, key: &str) -> ValidationResult<u32> {
    let value = required(map, key)?;
    let n = match value.as_i64() {
        Some(n) => n,
        None => match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => f as i64,
            _ => return Err(type_error(key, "an integer", value)),
        },
    };
    u32::try_from(n).map_err(|_| ValidationError::InvalidValue {
        field: key.to_string(),
        message: format!("Must be a non-negative integer, got {}", n),
    })
}

fn step_option(map: &OptionMap) -> ValidationResult<u32> {
    count_option(map, STEP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temperature_map() -> OptionMap {
        match json!({
            "bg_time_init": "2021/01/01 00:00:00",
            "bg_time_end": "2021/01/03",
            "tg_time_init": "2021-01-03T00:00:00",
            "tg_time_end": "2021/01/05 00:00:00",
            "step_size": 8,
            "thres_sd_heat": 1.5
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn decodes_temperature_options() {
        let options = TemperatureOptions::from_option_map(&temperature_map()).unwrap();
        assert_eq!(options.step_size, 8);
        assert_eq!(options.thres_sd_heat, 1.5);
        assert_eq!(format_time(&options.baseline.end), "2021/01/03 00:00:00");
        assert_eq!(format_time(&options.target.init), "2021/01/03 00:00:00");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut map = temperature_map();
        map.remove("thres_sd_heat");
        let err = TemperatureOptions::from_option_map(&map).unwrap_err();
        assert_eq!(err, ValidationError::MissingOption("thres_sd_heat".into()));
    }

    #[test]
    fn null_counts_as_missing() {
        let mut map = temperature_map();
        map.insert("step_size".into(), Value::Null);
        let err = TemperatureOptions::from_option_map(&map).unwrap_err();
        assert_eq!(err, ValidationError::MissingOption("step_size".into()));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let mut map = temperature_map();
        map.insert("thres_sd_heat".into(), json!("high"));
        let err = TemperatureOptions::from_option_map(&map).unwrap_err();
        assert!(matches!(err, ValidationError::ParseError { ref key, .. } if key == "thres_sd_heat"));
    }

    #[test]
    fn negative_step_is_invalid_value() {
        let mut map = temperature_map();
        map.insert("step_size".into(), json!(-3));
        let err = TemperatureOptions::from_option_map(&map).unwrap_err();
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn integral_float_step_is_accepted() {
        let mut map = temperature_map();
        map.insert("step_size".into(), json!(8.0));
        let options = TemperatureOptions::from_option_map(&map).unwrap();
        assert_eq!(options.step_size, 8);
    }

    #[test]
    fn serde_uses_flat_keys() {
        let options = TemperatureOptions::from_option_map(&temperature_map()).unwrap();
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["bg_time_init"], "2021/01/01 00:00:00");
        assert_eq!(value["step_size"], 8);
        let back: TemperatureOptions = serde_json::from_value(value).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn correlation_needs_both_keys() {
        let mut map = temperature_map();
        map.remove("thres_sd_heat");
        map.insert("sd_num".into(), json!(1.5));
        let err = CorrelationOptions::from_option_map(&map).unwrap_err();
        assert_eq!(err, ValidationError::MissingOption("error_step".into()));

        map.insert("error_step".into(), json!(1));
        let options = CorrelationOptions::from_option_map(&map).unwrap();
        assert_eq!(options.error_step, 1);
        assert_eq!(options.sd_num, 1.5);
    }

    #[test]
    fn date_span_parses() {
        let range = TimeRange::parse_date_span("2021/01/01-2021/01/03").unwrap();
        assert_eq!(format_time(&range.init), "2021/01/01 00:00:00");
        assert_eq!(format_time(&range.end), "2021/01/03 00:00:00");
        assert!(TimeRange::parse_date_span("2021/01/01").is_err());
    }

    #[test]
    fn day_windows_cover_whole_days() {
        let range = TimeRange::parse_date_span("2021/01/01-2021/01/03").unwrap();
        let windows: Vec<_> = range.day_windows().collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(format_time(&windows[2].0), "2021/01/03 00:00:00");
        assert_eq!(format_time(&windows[2].1), "2021/01/04 00:00:00");
    }

    #[test]
    fn contains_is_inclusive() {
        let range = TimeRange::parse_date_span("2021/01/01-2021/01/02").unwrap();
        assert!(range.contains(&range.init));
        assert!(range.contains(&range.end));
        assert!(!range.contains(&(range.end + Duration::seconds(1))));
    }
}
