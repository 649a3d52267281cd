//! Fuzz target for whole sample files.
//!
//! Reads the bytes as a CSV, then runs timestamp parsing, distance
//! derivation and window aggregation on whatever survives.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_core::ingest::read_samples;
use mc_core::preprocess::{compute_distance, parse_timestamps};
use mc_core::window;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = read_samples(data) else {
        return;
    };
    let Ok(table) = parse_timestamps(&raw, "time", mc_config::TIME_FORMAT) else {
        return;
    };
    if let Ok(table) = compute_distance(&table) {
        let _ = window::aggregate(&table, 8);
    }
});
