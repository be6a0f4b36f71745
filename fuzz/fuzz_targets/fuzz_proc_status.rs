//! Fuzz target for `/proc/<pid>/status` and `/proc/<pid>/stat` parsing.
//!
//! Both files are read from other processes; a comm name can hold any
//! byte, including `)` and newlines.

#![no_main]

use hp_core::parse::{
    parse_capabilities, parse_seccomp, parse_stat, parse_status, parse_status_memory,
    process_cpu_times,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_status(data);
    let _ = parse_status_memory(data);
    let _ = parse_capabilities(data);
    let _ = parse_seccomp(data);
    if let Ok(stat) = parse_stat(data) {
        let _ = process_cpu_times(&stat, 100);
    }
});
