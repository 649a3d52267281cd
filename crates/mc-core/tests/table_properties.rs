//! Property tests for table slicing and aggregation.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mc_core::table::{Column, TimeSeriesTable};
use mc_core::window;
use proptest::prelude::*;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn sample_table(values: &[f64]) -> TimeSeriesTable {
    let times = (0..values.len())
        .map(|i| t0() + Duration::minutes(i as i64))
        .collect();
    let mut columns = vec![("time".to_string(), Column::Time(times))];
    for label in [
        "max_temperature",
        "max_pos_x",
        "max_pos_y",
        "min_temperature",
        "min_pos_x",
        "min_pos_y",
        "distance",
    ] {
        columns.push((label.to_string(), Column::Float(values.to_vec())));
    }
    TimeSeriesTable::from_columns(columns).unwrap()
}

proptest! {
    #[test]
    fn split_covers_every_row_in_order(
        values in prop::collection::vec(-100.0f64..100.0, 0..200),
        size in 1usize..50,
    ) {
        let table = sample_table(&values);
        let windows: Vec<_> = table.split(size).unwrap().collect();
        prop_assert_eq!(windows.len(), values.len().div_ceil(size));

        let mut rejoined = Vec::new();
        for (i, w) in windows.iter().enumerate() {
            if i + 1 < windows.len() {
                prop_assert_eq!(w.len(), size);
            } else {
                prop_assert!(!w.is_empty() && w.len() <= size);
            }
            rejoined.extend_from_slice(w.floats("distance").unwrap());
        }
        prop_assert_eq!(rejoined, values);
    }

    #[test]
    fn select_keeps_rows_and_requested_order(values in prop::collection::vec(0.0f64..10.0, 0..50)) {
        let table = sample_table(&values);
        let picked = table.select(&["distance", "time"]).unwrap();
        prop_assert_eq!(picked.len(), table.len());
        prop_assert_eq!(picked.labels(), &["distance".to_string(), "time".to_string()][..]);
    }

    #[test]
    fn between_is_inclusive_and_ordered(
        len in 1usize..120,
        a in 0i64..120,
        b in 0i64..120,
    ) {
        let table = sample_table(&vec![1.0; len]);
        let (lo, hi) = (a.min(b), a.max(b));
        let init = t0() + Duration::minutes(lo);
        let end = t0() + Duration::minutes(hi);
        let sliced = table.between("time", &init, &end).unwrap();

        let expected = (0..len as i64).filter(|m| lo <= *m && *m <= hi).count();
        prop_assert_eq!(sliced.len(), expected);
        let times = sliced.times("time").unwrap();
        prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(times.iter().all(|t| init <= *t && *t <= end));
    }

    #[test]
    fn window_means_stay_within_the_window(
        values in prop::collection::vec(-50.0f64..50.0, 1..120),
        size in 1usize..16,
    ) {
        let table = sample_table(&values);
        let windowed = window::aggregate(&table, size).unwrap();
        prop_assert_eq!(windowed.len(), values.len().div_ceil(size));
        prop_assert_eq!(windowed.labels().len(), 15);

        let means = windowed.floats("distance_mean").unwrap();
        for (chunk, mean) in values.chunks(size).zip(means) {
            let lo = chunk.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = chunk.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(*mean >= lo - 1e-9 && *mean <= hi + 1e-9);
        }
    }
}

#[test]
fn zero_split_size_is_rejected() {
    let table = sample_table(&[1.0, 2.0]);
    assert_eq!(table.split(0).unwrap_err().code(), 11);
}

#[test]
fn nan_cells_are_skipped_by_aggregates() {
    let table = sample_table(&[1.0, f64::NAN, 3.0]);
    let mean = table.select(&["distance"]).unwrap().mean();
    assert_eq!(mean.floats("distance_mean").unwrap(), &[2.0]);
}
