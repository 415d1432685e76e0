//! Fuzz target for metadata parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sr_dump::metadata;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = metadata::parse(text, 100_000_000);
    }
});
