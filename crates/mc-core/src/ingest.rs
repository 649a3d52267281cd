//! Header-less sample CSV ingestion.
//!
//! Each line holds the seven sample fields in fixed order:
//! `time,max_temperature,max_pos_x,max_pos_y,min_temperature,min_pos_x,min_pos_y`.
//! Blank lines are skipped and an empty numeric cell reads as NaN.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mc_common::{Error, Result};
use tracing::{debug, info};

use crate::columns::{SAMPLE_COLUMNS, TIME};
use crate::logging::{event_names, Stage};
use crate::preprocess::{compute_distance, parse_timestamps};
use crate::table::{Column, TimeSeriesTable};

/// One parsed CSV line with the time still as text.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub time: String,
    pub values: [f64; 6],
}

/// Parse one CSV line; `line_no` is 1-based and only used in messages.
pub fn parse_record(line_no: usize, line: &str) -> Result<SampleRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != SAMPLE_COLUMNS.len() {
        return Err(Error::Schema(format!(
            "line {}: expected {} fields, found {}",
            line_no,
            SAMPLE_COLUMNS.len(),
            fields.len()
        )));
    }

    let mut values = [f64::NAN; 6];
    for (slot, (label, text)) in values
        .iter_mut()
        .zip(SAMPLE_COLUMNS[1..].iter().zip(&fields[1..]))
    {
        if text.is_empty() {
            continue;
        }
        *slot = text.parse::<f64>().map_err(|e| {
            Error::Parse(format!("line {}: {} = {:?}: {}", line_no, label, text, e))
        })?;
    }

    Ok(SampleRecord {
        time: fields[0].to_string(),
        values,
    })
}

/// Read every record into a raw table whose `time` column is text.
pub fn read_samples<R: BufRead>(reader: R) -> Result<TimeSeriesTable> {
    let mut times = Vec::new();
    let mut values: [Vec<f64>; 6] = Default::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(idx + 1, line)?;
        times.push(record.time);
        for (column, v) in values.iter_mut().zip(record.values) {
            column.push(v);
        }
    }

    let mut columns = vec![(TIME.to_string(), Column::Text(times))];
    columns.extend(
        SAMPLE_COLUMNS[1..]
            .iter()
            .zip(values)
            .map(|(label, v)| (label.to_string(), Column::Float(v))),
    );
    TimeSeriesTable::from_columns(columns)
}

/// Load a sample file: read, parse timestamps, derive distance.
pub fn load_samples(path: &Path) -> Result<TimeSeriesTable> {
    let file = File::open(path)?;
    let raw = read_samples(BufReader::new(file))?;
    debug!(
        event = event_names::INGEST_LOADED,
        stage = %Stage::Ingest,
        path = %path.display(),
        rows = raw.len(),
        "raw samples read"
    );

    let table = parse_timestamps(&raw, TIME, mc_config::TIME_FORMAT)?;
    let table = compute_distance(&table)?;
    info!(
        event = event_names::INGEST_DISTANCE,
        stage = %Stage::Ingest,
        rows = table.len(),
        "samples loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{DISTANCE, MAX_TEMPERATURE, MIN_POS_Y};
    use std::io::Cursor;

    #[test]
    fn parses_fixed_column_order() {
        let r = parse_record(1, "2021/01/01 00:00:00, 36.5,1,2,35.0,3,4").unwrap();
        assert_eq!(r.time, "2021/01/01 00:00:00");
        assert_eq!(r.values, [36.5, 1.0, 2.0, 35.0, 3.0, 4.0]);
    }

    #[test]
    fn wrong_width_is_schema_error() {
        let err = parse_record(3, "2021/01/01 00:00:00,36.5").unwrap_err();
        assert_eq!(err.code(), 21);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn bad_number_is_parse_error() {
        let err = parse_record(1, "2021/01/01 00:00:00,hot,1,2,3,4,5").unwrap_err();
        assert_eq!(err.code(), 20);
        assert!(err.to_string().contains("max_temperature"));
    }

    #[test]
    fn empty_cell_reads_as_nan() {
        let r = parse_record(1, "2021/01/01 00:00:00,,1,2,3,4,5").unwrap();
        assert!(r.values[0].is_nan());
    }

    #[test]
    fn read_skips_blank_lines() {
        let csv = "2021/01/01 00:00:00,36,0,0,35,0,0\n\n2021/01/01 00:01:00,37,3,4,35,0,1\n";
        let t = read_samples(Cursor::new(csv)).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.labels().len(), 7);
        assert_eq!(t.floats(MAX_TEMPERATURE).unwrap(), &[36.0, 37.0]);
        assert_eq!(t.floats(MIN_POS_Y).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn empty_input_is_typed_and_empty() {
        let t = read_samples(Cursor::new("")).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.labels().len(), 7);
    }

    #[test]
    fn load_samples_derives_distance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mouse.csv");
        std::fs::write(
            &path,
            "2021/01/01 00:00:00,36,0,0,35,0,0\n2021/01/01 00:01:00,37,3,4,35,0,0\n",
        )
        .unwrap();
        let t = load_samples(&path).unwrap();
        assert_eq!(t.floats(DISTANCE).unwrap(), &[0.0, 5.0]);
        assert_eq!(t.times(TIME).unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_samples(Path::new("/nonexistent/mouse.csv")).unwrap_err();
        assert_eq!(err.code(), 60);
    }
}
