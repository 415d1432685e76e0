//! Fuzz target for .sr archive reading.
//!
//! Archives may come from other tools; reading must return an error on bad
//! input, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sr_dump::DumpConverter;

fuzz_target!(|data: &[u8]| {
    let _ = DumpConverter::default().read_from_bytes(data.to_vec());
});
