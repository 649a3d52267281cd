//! Labeled, column-oriented time series table.
//!
//! A [`TimeSeriesTable`] holds equally long typed columns addressed by
//! label. Every query returns a new table; [`TimeSeriesTable::append`],
//! [`TimeSeriesTable::push_row`] and [`TimeSeriesTable::sort_by`] are the
//! only operations that mutate in place. Row order is insertion order and
//! is never re-sorted implicitly.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, Timelike};
use mc_common::{Error, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Suffix for column means produced by [`TimeSeriesTable::mean`].
pub const MEAN_SUFFIX: &str = "_mean";
/// Suffix for column standard deviations produced by [`TimeSeriesTable::std`].
pub const STD_SUFFIX: &str = "_std";
/// Suffix for column medians produced by [`TimeSeriesTable::median`].
pub const MEDIAN_SUFFIX: &str = "_median";

/// Element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Time,
    Text,
}

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
}

impl Column {
    pub fn empty(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Float => Column::Float(Vec::new()),
            ColumnKind::Time => Column::Time(Vec::new()),
            ColumnKind::Text => Column::Text(Vec::new()),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Float(_) => ColumnKind::Float,
            Column::Time(_) => ColumnKind::Time,
            Column::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Time(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Float(v) => Column::Float(rows.iter().map(|&i| v[i]).collect()),
            Column::Time(v) => Column::Time(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Column {
        match self {
            Column::Float(v) => Column::Float(v[start..end].to_vec()),
            Column::Time(v) => Column::Time(v[start..end].to_vec()),
            Column::Text(v) => Column::Text(v[start..end].to_vec()),
        }
    }

    fn extend_from(&mut self, other: &Column) -> bool {
        match (self, other) {
            (Column::Float(a), Column::Float(b)) => a.extend_from_slice(b),
            (Column::Time(a), Column::Time(b)) => a.extend_from_slice(b),
            (Column::Text(a), Column::Text(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    fn push(&mut self, cell: Cell) -> std::result::Result<(), Cell> {
        match (self, cell) {
            (Column::Float(v), Cell::Float(x)) => v.push(x),
            (Column::Time(v), Cell::Time(t)) => v.push(t),
            (Column::Text(v), Cell::Text(s)) => v.push(s),
            (_, cell) => return Err(cell),
        }
        Ok(())
    }

    fn cell(&self, row: usize) -> Cell {
        match self {
            Column::Float(v) => Cell::Float(v[row]),
            Column::Time(v) => Cell::Time(v[row]),
            Column::Text(v) => Cell::Text(v[row].clone()),
        }
    }

    fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        match self {
            Column::Float(v) => v[a].total_cmp(&v[b]),
            Column::Time(v) => v[a].cmp(&v[b]),
            Column::Text(v) => v[a].cmp(&v[b]),
        }
    }
}

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Float(f64),
    Time(NaiveDateTime),
    Text(String),
}

impl Cell {
    fn kind(&self) -> ColumnKind {
        match self {
            Cell::Float(_) => ColumnKind::Float,
            Cell::Time(_) => ColumnKind::Time,
            Cell::Text(_) => ColumnKind::Text,
        }
    }
}

/// Borrowed view of one row, handed to [`TimeSeriesTable::query`] predicates.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a TimeSeriesTable,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Float cell, or `None` when the column is missing or not numeric.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.table.column(name).ok()? {
            Column::Float(v) => Some(v[self.index]),
            _ => None,
        }
    }

    /// Timestamp cell, or `None` when the column is missing or not a time column.
    pub fn time(&self, name: &str) -> Option<NaiveDateTime> {
        match self.table.column(name).ok()? {
            Column::Time(v) => Some(v[self.index]),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        match self.table.column(name).ok()? {
            Column::Text(v) => Some(v[self.index].as_str()),
            _ => None,
        }
    }
}

/// Sortable integer encoding `YYYYMMDDHHMMSS` of a timestamp.
///
/// Sub-second precision is dropped.
pub fn time_key(t: &NaiveDateTime) -> i64 {
    let date = t.date();
    let time = t.time();
    ((date.year() as i64 * 100 + date.month() as i64) * 100 + date.day() as i64) * 1_000_000
        + (time.hour() as i64 * 100 + time.minute() as i64) * 100
        + time.second() as i64
}

/// Mean of timestamps, computed on microseconds since the Unix epoch.
pub fn mean_time(times: &[NaiveDateTime]) -> Option<NaiveDateTime> {
    if times.is_empty() {
        return None;
    }
    let n = times.len() as i128;
    let sum: i128 = times
        .iter()
        .map(|t| t.and_utc().timestamp_micros() as i128)
        .sum();
    let micros = i64::try_from(sum / n).ok()?;
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// A labeled table of equally long typed columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Column>,
    rows: usize,
}

impl TimeSeriesTable {
    /// An empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-row table typed by `schema`.
    pub fn with_schema(schema: &[(&str, ColumnKind)]) -> Result<Self> {
        Self::from_columns(
            schema
                .iter()
                .map(|(name, kind)| (name.to_string(), Column::empty(*kind)))
                .collect(),
        )
    }

    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut table = TimeSeriesTable::new();
        let mut rows = None;
        for (name, column) in columns {
            match rows {
                None => rows = Some(column.len()),
                Some(n) if n != column.len() => {
                    return Err(Error::Schema(format!(
                        "column {} has {} rows, expected {}",
                        name,
                        column.len(),
                        n
                    )))
                }
                Some(_) => {}
            }
            table.insert_column(name, column)?;
        }
        table.rows = rows.unwrap_or(0);
        Ok(table)
    }

    fn insert_column(&mut self, name: String, column: Column) -> Result<()> {
        if self.index.contains_key(&name) {
            return Err(Error::Schema(format!("duplicate column {}", name)));
        }
        self.index.insert(name.clone(), self.columns.len());
        self.labels.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column labels in order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label and kind of every column.
    pub fn schema(&self) -> Vec<(String, ColumnKind)> {
        self.labels
            .iter()
            .cloned()
            .zip(self.columns.iter().map(Column::kind))
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_string(),
            })
    }

    pub fn floats(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Float, other.kind())),
        }
    }

    pub fn times(&self, name: &str) -> Result<&[NaiveDateTime]> {
        match self.column(name)? {
            Column::Time(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Time, other.kind())),
        }
    }

    pub fn texts(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Text, other.kind())),
        }
    }

    /// Cells of one row in label order.
    pub fn row(&self, index: usize) -> Option<Vec<Cell>> {
        (index < self.rows).then(|| self.columns.iter().map(|c| c.cell(index)).collect())
    }

    /// New table with only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| Ok((name.to_string(), self.column(name)?.clone())))
            .collect::<Result<Vec<_>>>()?;
        let mut table = Self::from_columns(columns)?;
        table.rows = self.rows;
        Ok(table)
    }

    /// Rows for which `predicate` holds, in table order.
    pub fn query<F>(&self, predicate: F) -> Self
    where
        F: Fn(Row<'_>) -> bool,
    {
        let rows: Vec<usize> = (0..self.rows)
            .filter(|&index| predicate(Row { table: self, index }))
            .collect();
        self.take(&rows)
    }

    /// Rows whose `column` timestamp lies in `[init, end]`.
    ///
    /// Comparison is done on [`time_key`] encodings.
    pub fn between(&self, column: &str, init: &NaiveDateTime, end: &NaiveDateTime) -> Result<Self> {
        let (lo, hi) = (time_key(init), time_key(end));
        let keys: Vec<i64> = self.times(column)?.iter().map(time_key).collect();
        Ok(self.query(|row| {
            let key = keys[row.index()];
            lo <= key && key <= hi
        }))
    }

    /// Rows whose time of day lies in `[start, end)`, ignoring the date.
    ///
    /// When `end <= start` the interval wraps past midnight, so
    /// `start == end` keeps every row.
    pub fn between_time_of_day(&self, column: &str, start: NaiveTime, end: NaiveTime) -> Result<Self> {
        let times = self.times(column)?;
        let wraps = end <= start;
        Ok(self.query(|row| {
            let t = times[row.index()].time();
            if wraps {
                t >= start || t < end
            } else {
                t >= start && t < end
            }
        }))
    }

    /// Consecutive chunks of `size` rows; the last may be shorter.
    pub fn split(&self, size: usize) -> Result<Windows<'_>> {
        if size == 0 {
            return Err(Error::InvalidArgument(
                "window size must be positive, got 0".to_string(),
            ));
        }
        Ok(Windows {
            table: self,
            size,
            offset: 0,
        })
    }

    /// One-row table of NaN-skipping means of every float column.
    pub fn mean(&self) -> Self {
        self.reduce(MEAN_SUFFIX, mc_math::mean)
    }

    /// One-row table of sample standard deviations (ddof = 1) of every float column.
    pub fn std(&self) -> Self {
        self.reduce(STD_SUFFIX, mc_math::std_dev)
    }

    /// One-row table of medians of every float column.
    pub fn median(&self) -> Self {
        self.reduce(MEDIAN_SUFFIX, mc_math::median)
    }

    fn reduce(&self, suffix: &str, f: fn(&[f64]) -> f64) -> Self {
        let mut table = TimeSeriesTable::new();
        for (label, column) in self.labels.iter().zip(&self.columns) {
            if let Column::Float(values) = column {
                // labels are unique, so suffixed labels are too
                let _ = table.insert_column(format!("{}{}", label, suffix), Column::Float(vec![f(values)]));
            }
        }
        table.rows = 1;
        table
    }

    /// Mean timestamp of `column`, `None` for an empty table.
    pub fn time_mean(&self, column: &str) -> Result<Option<NaiveDateTime>> {
        Ok(mean_time(self.times(column)?))
    }

    /// Column-wise union of two tables with the same row count.
    pub fn join(&self, other: &TimeSeriesTable) -> Result<Self> {
        if self.labels.is_empty() {
            return Ok(other.clone());
        }
        if other.labels.is_empty() {
            return Ok(self.clone());
        }
        if self.rows != other.rows {
            return Err(Error::Schema(format!(
                "cannot join tables of {} and {} rows",
                self.rows, other.rows
            )));
        }
        let mut joined = self.clone();
        for (label, column) in other.labels.iter().zip(&other.columns) {
            joined.insert_column(label.clone(), column.clone())?;
        }
        Ok(joined)
    }

    /// This table with one extra column.
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self> {
        if !self.labels.is_empty() && column.len() != self.rows {
            return Err(Error::Schema(format!(
                "column {} has {} rows, expected {}",
                name,
                column.len(),
                self.rows
            )));
        }
        if self.labels.is_empty() {
            self.rows = column.len();
        }
        self.insert_column(name.to_string(), column)?;
        Ok(self)
    }

    /// Append the rows of `other` in place.
    ///
    /// A table without columns adopts `other`'s schema; otherwise labels
    /// and kinds must match exactly.
    pub fn append(&mut self, other: &TimeSeriesTable) -> Result<()> {
        if self.labels.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if self.schema() != other.schema() {
            return Err(Error::Schema(format!(
                "cannot append columns {:?} to {:?}",
                other.labels, self.labels
            )));
        }
        for (column, extra) in self.columns.iter_mut().zip(&other.columns) {
            column.extend_from(extra);
        }
        self.rows += other.rows;
        Ok(())
    }

    /// Append one row given as cells in label order.
    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "row has {} cells, table has {} columns",
                cells.len(),
                self.columns.len()
            )));
        }
        for ((label, column), cell) in self.labels.iter().zip(&self.columns).zip(&cells) {
            if column.kind() != cell.kind() {
                return Err(kind_mismatch(label, column.kind(), cell.kind()));
            }
        }
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            // kinds were checked above
            let _ = column.push(cell);
        }
        self.rows += 1;
        Ok(())
    }

    /// Stable in-place sort by the natural order of `column`.
    pub fn sort_by(&mut self, column: &str) -> Result<()> {
        let key = self.column(column)?;
        let mut order: Vec<usize> = (0..self.rows).collect();
        order.sort_by(|&a, &b| key.compare_rows(a, b));
        *self = self.take(&order);
        Ok(())
    }

    fn take(&self, rows: &[usize]) -> Self {
        TimeSeriesTable {
            labels: self.labels.clone(),
            index: self.index.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        TimeSeriesTable {
            labels: self.labels.clone(),
            index: self.index.clone(),
            columns: self.columns.iter().map(|c| c.slice(start, end)).collect(),
            rows: end - start,
        }
    }
}

fn kind_mismatch(name: &str, expected: ColumnKind, found: ColumnKind) -> Error {
    Error::Schema(format!(
        "column {} holds {:?} values, expected {:?}",
        name, found, expected
    ))
}

/// Lazy iterator over fixed-size row windows, see [`TimeSeriesTable::split`].
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    table: &'a TimeSeriesTable,
    size: usize,
    offset: usize,
}

impl Iterator for Windows<'_> {
    type Item = TimeSeriesTable;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.table.rows {
            return None;
        }
        let end = (self.offset + self.size).min(self.table.rows);
        let window = self.table.slice(self.offset, end);
        self.offset = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.rows.saturating_sub(self.offset).div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Serialized as an array of row objects keyed by label.
impl Serialize for TimeSeriesTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for row in 0..self.rows {
            seq.serialize_element(&RowRecord { table: self, row })?;
        }
        seq.end()
    }
}

struct RowRecord<'a> {
    table: &'a TimeSeriesTable,
    row: usize,
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.labels.len()))?;
        for (label, column) in self.table.labels.iter().zip(&self.table.columns) {
            match column {
                Column::Float(v) => map.serialize_entry(label, &v[self.row])?,
                Column::Time(v) => {
                    map.serialize_entry(label, &mc_config::format_time(&v[self.row]))?
                }
                Column::Text(v) => map.serialize_entry(label, &v[self.row])?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y/%m/%d %H:%M:%S").unwrap()
    }

    fn sample() -> TimeSeriesTable {
        TimeSeriesTable::from_columns(vec![
            (
                "time".to_string(),
                Column::Time(vec![
                    ts("2021/01/01 23:59:00"),
                    ts("2021/01/02 00:00:00"),
                    ts("2021/01/02 00:01:00"),
                    ts("2021/01/02 12:00:00"),
                    ts("2021/01/03 00:00:00"),
                ]),
            ),
            (
                "temp".to_string(),
                Column::Float(vec![36.0, 36.5, f64::NAN, 37.5, 38.0]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn select_keeps_order_and_values() {
        let t = sample();
        let s = t.select(&["temp", "time"]).unwrap();
        assert_eq!(s.labels(), &["temp".to_string(), "time".to_string()]);
        assert_eq!(s.len(), 5);
        assert_eq!(s.times("time").unwrap(), t.times("time").unwrap());
    }

    #[test]
    fn select_unknown_column_fails() {
        let err = sample().select(&["speed"]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref name } if name == "speed"));
    }

    #[test]
    fn between_is_inclusive() {
        let t = sample();
        let r = t
            .between("time", &ts("2021/01/02 00:00:00"), &ts("2021/01/03 00:00:00"))
            .unwrap();
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn time_of_day_is_half_open() {
        let t = sample();
        let start = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(0, 1, 0).unwrap();
        let r = t.between_time_of_day("time", start, end).unwrap();
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn time_of_day_wraps_midnight() {
        let t = sample();
        let start = NaiveTime::from_hms_opt(23, 52, 0).unwrap();
        let end = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let r = t.between_time_of_day("time", start, end).unwrap();
        assert_eq!(r.len(), 1);

        let whole_day = t.between_time_of_day("time", end, end).unwrap();
        assert_eq!(whole_day.len(), 5);
    }

    #[test]
    fn split_counts_windows() {
        let t = sample();
        let windows: Vec<_> = t.split(2).unwrap().collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].len(), 1);
        assert_eq!(t.split(2).unwrap().len(), 3);
        assert!(matches!(t.split(0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn aggregates_skip_nan_and_suffix_labels() {
        let t = sample();
        let mean = t.mean();
        assert_eq!(mean.labels(), &["temp_mean".to_string()]);
        assert_eq!(mean.len(), 1);
        assert!((mean.floats("temp_mean").unwrap()[0] - 37.0).abs() < 1e-12);
        assert!((t.median().floats("temp_median").unwrap()[0] - 37.0).abs() < 1e-12);
        let std = t.std().floats("temp_std").unwrap()[0];
        assert!((std - (5.0f64 / 6.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn aggregates_of_empty_table_are_nan() {
        let empty = sample().query(|_| false);
        assert!(empty.is_empty());
        assert!(empty.mean().floats("temp_mean").unwrap()[0].is_nan());
        assert!(empty.std().floats("temp_std").unwrap()[0].is_nan());
        assert_eq!(empty.time_mean("time").unwrap(), None);
    }

    #[test]
    fn time_mean_averages_instants() {
        let t = TimeSeriesTable::from_columns(vec![(
            "time".to_string(),
            Column::Time(vec![ts("2021/01/01 00:00:00"), ts("2021/01/01 00:02:00")]),
        )])
        .unwrap();
        assert_eq!(t.time_mean("time").unwrap(), Some(ts("2021/01/01 00:01:00")));
    }

    #[test]
    fn join_requires_equal_rows() {
        let t = sample();
        let joined = t.select(&["time"]).unwrap().join(&t.select(&["temp"]).unwrap()).unwrap();
        assert_eq!(joined, t);
        assert!(t.join(&t.mean()).is_err());
        assert!(t.join(&t).is_err());
    }

    #[test]
    fn append_adopts_schema_then_checks_it() {
        let mut acc = TimeSeriesTable::new();
        let t = sample();
        acc.append(&t).unwrap();
        acc.append(&t).unwrap();
        assert_eq!(acc.len(), 10);
        assert!(acc.append(&t.mean()).is_err());
    }

    #[test]
    fn push_row_checks_kinds() {
        let mut t = TimeSeriesTable::with_schema(&[("time", ColumnKind::Time), ("v", ColumnKind::Float)]).unwrap();
        t.push_row(vec![Cell::Time(ts("2021/01/01 00:00:00")), Cell::Float(1.0)])
            .unwrap();
        assert!(t.push_row(vec![Cell::Float(1.0), Cell::Float(1.0)]).is_err());
        assert!(t.push_row(vec![Cell::Float(1.0)]).is_err());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn sort_is_stable() {
        let mut t = TimeSeriesTable::from_columns(vec![
            ("k".to_string(), Column::Float(vec![2.0, 1.0, 2.0, 1.0])),
            ("tag".to_string(), Column::Text(vec!["a".into(), "b".into(), "c".into(), "d".into()])),
        ])
        .unwrap();
        t.sort_by("k").unwrap();
        assert_eq!(t.texts("tag").unwrap(), &["b", "d", "a", "c"]);
    }

    #[test]
    fn time_key_is_sortable() {
        assert_eq!(time_key(&ts("2021/01/02 03:04:05")), 20210102030405);
        assert!(time_key(&ts("2021/01/01 23:59:59")) < time_key(&ts("2021/01/02 00:00:00")));
    }

    #[test]
    fn serializes_as_records() {
        let t = sample().select(&["time", "temp"]).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json[0]["time"], "2021/01/01 23:59:00");
        assert_eq!(json[0]["temp"], 36.0);
        assert!(json[2]["temp"].is_null());
    }
}
