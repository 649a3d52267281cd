//! Fuzz target for single CSV sample lines.
//!
//! Parsing arbitrary text must return a record or an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_core::ingest::parse_record;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = parse_record(1, line);
    }
});
