//! Fuzz target: `decode_frame`
//!
//! Feeds arbitrary 5-byte frames to the DHT22 decoder and checks that
//! anything it accepts is a plausible reading.
//!
//! cargo fuzz run fuzz_climate_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use lampctl::sensors::climate::decode_frame;

fuzz_target!(|frame: [u8; 5]| {
    if let Ok(r) = decode_frame(frame) {
        assert!((0.0..=100.0).contains(&r.humidity));
        assert!((-40.0..=80.0).contains(&r.temperature));
    }
});
