//! Fuzz target for detector option mappings.
//!
//! Arbitrary JSON objects must decode to options or a validation error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_config::{CorrelationOptions, DistanceOptions, OptionMap, TemperatureOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(map) = serde_json::from_slice::<OptionMap>(data) else {
        return;
    };
    let _ = TemperatureOptions::from_option_map(&map);
    let _ = DistanceOptions::from_option_map(&map);
    let _ = CorrelationOptions::from_option_map(&map);
});
