//! Fuzz target for `kern.procargs2` buffer decoding.
//!
//! The buffer describes another process, so `decode_procargs` must never
//! panic or over-read whatever the header count and string layout say.

#![no_main]

use hp_core::parse::decode_procargs;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(decoded) = decode_procargs(data) {
        // Every decoded argument consumed at least its terminator.
        assert!(decoded.args.len() <= data.len());
    }
});
