//! Fixed-size window aggregation.
//!
//! Each window of `size` consecutive rows collapses to one row holding the
//! mean timestamp followed by the mean and standard deviation of every
//! column in [`WINDOW_COLUMNS`].

use mc_common::{Error, Result};
use tracing::debug;

use crate::columns::{mean_of, std_of, TIME, WINDOW_COLUMNS};
use crate::logging::{event_names, Stage};
use crate::table::{Column, ColumnKind, TimeSeriesTable};

/// Labels of the windowed table in output order.
pub fn windowed_labels() -> Vec<String> {
    std::iter::once(TIME.to_string())
        .chain(WINDOW_COLUMNS.iter().map(|c| mean_of(c)))
        .chain(WINDOW_COLUMNS.iter().map(|c| std_of(c)))
        .collect()
}

/// Aggregate `table` into one row per window of `size` rows.
pub fn aggregate(table: &TimeSeriesTable, size: usize) -> Result<TimeSeriesTable> {
    let windows = table.split(size)?;
    let count = windows.len();

    let mut out = empty_windowed()?;
    for window in windows {
        let numeric = window.select(&WINDOW_COLUMNS)?;
        let time = window
            .time_mean(TIME)?
            .ok_or_else(|| Error::Schema("empty window".to_string()))?;
        let row = TimeSeriesTable::from_columns(vec![(TIME.to_string(), Column::Time(vec![time]))])?
            .join(&numeric.mean())?
            .join(&numeric.std())?;
        out.append(&row)?;
    }

    debug!(
        event = event_names::WINDOW_AGGREGATED,
        stage = %Stage::Window,
        rows = table.len(),
        window_size = size,
        windows = count,
        "window aggregation done"
    );
    Ok(out)
}

fn empty_windowed() -> Result<TimeSeriesTable> {
    let labels = windowed_labels();
    let schema: Vec<(&str, ColumnKind)> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let kind = if i == 0 { ColumnKind::Time } else { ColumnKind::Float };
            (l.as_str(), kind)
        })
        .collect();
    TimeSeriesTable::with_schema(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::SAMPLE_COLUMNS;
    use chrono::{Duration, NaiveDate};

    fn minutes(n: usize) -> TimeSeriesTable {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut columns = vec![(
            TIME.to_string(),
            Column::Time((0..n).map(|i| start + Duration::minutes(i as i64)).collect()),
        )];
        for label in SAMPLE_COLUMNS[1..].iter().copied().chain(["distance"]) {
            columns.push((label.to_string(), Column::Float((0..n).map(|i| i as f64).collect())));
        }
        TimeSeriesTable::from_columns(columns).unwrap()
    }

    #[test]
    fn one_row_per_window() {
        let w = aggregate(&minutes(10), 4).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.labels(), windowed_labels().as_slice());
        assert_eq!(w.floats("distance_mean").unwrap(), &[1.5, 5.5, 8.5]);
        assert_eq!(
            mc_config::format_time(&w.times(TIME).unwrap()[0]),
            "2021/01/01 00:01:30"
        );
    }

    #[test]
    fn single_row_window_has_nan_std() {
        let w = aggregate(&minutes(3), 2).unwrap();
        assert!(w.floats("max_temperature_std").unwrap()[1].is_nan());
    }

    #[test]
    fn zero_size_is_invalid() {
        let err = aggregate(&minutes(3), 0).unwrap_err();
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn empty_input_gives_typed_empty_output() {
        let w = aggregate(&minutes(0), 8).unwrap();
        assert!(w.is_empty());
        assert_eq!(w.labels().len(), 15);
    }

    #[test]
    fn missing_distance_is_unknown_column() {
        let t = minutes(4).select(&SAMPLE_COLUMNS).unwrap();
        assert!(matches!(aggregate(&t, 2), Err(Error::UnknownColumn { .. })));
    }
}
