//! Ingestion-time transforms: timestamp parsing and derived distance.

use chrono::NaiveDateTime;
use mc_common::{Error, Result};

use crate::columns::{DISTANCE, MAX_POS_X, MAX_POS_Y};
use crate::table::{Column, TimeSeriesTable};

/// Replace the text column `column` with parsed timestamps.
///
/// Any malformed cell fails the whole table; rows are never skipped.
pub fn parse_timestamps(table: &TimeSeriesTable, column: &str, format: &str) -> Result<TimeSeriesTable> {
    let parsed = table
        .texts(column)?
        .iter()
        .enumerate()
        .map(|(row, text)| {
            NaiveDateTime::parse_from_str(text.trim(), format).map_err(|e| {
                Error::Parse(format!(
                    "row {}: {:?} is not a valid timestamp ({})",
                    row + 1,
                    text,
                    e
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns = table
        .labels()
        .iter()
        .map(|label| Ok((label.clone(), table.column(label)?.clone())))
        .collect::<Result<Vec<_>>>()?;
    if let Some(slot) = columns.iter_mut().find(|(label, _)| label == column) {
        slot.1 = Column::Time(parsed);
    }
    TimeSeriesTable::from_columns(columns)
}

/// Displacement between consecutive positions; the first entry is 0.
pub fn distances(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(x.len());
    for i in 0..x.len().min(y.len()) {
        if i == 0 {
            out.push(0.0);
        } else {
            out.push((x[i] - x[i - 1]).hypot(y[i] - y[i - 1]));
        }
    }
    out
}

/// Join a `distance` column computed from the max-position columns.
pub fn compute_distance(table: &TimeSeriesTable) -> Result<TimeSeriesTable> {
    let x = table.floats(MAX_POS_X)?;
    let y = table.floats(MAX_POS_Y)?;
    let distance = distances(x, y);
    table.clone().with_column(DISTANCE, Column::Float(distance))
}
