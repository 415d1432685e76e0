//! Fuzz target for sample stream decoding.
//!
//! The first byte picks the probe count, the rest is the packed stream.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sr_dump::sample;

fuzz_target!(|data: &[u8]| {
    if let Some((&count, packed)) = data.split_first() {
        let decoded = sample::decode(packed, usize::from(count));
        assert_eq!(decoded.len(), usize::from(count));
    }
});
