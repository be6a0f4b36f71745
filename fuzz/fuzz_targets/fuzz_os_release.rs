//! Fuzz target for os-release and `<distrib>-release` parsing.

#![no_main]

use hp_core::parse::{parse_distrib_release, parse_os_release, version_components};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(info) = parse_os_release(data) {
        let _ = version_components(&info.version);
    }
    let _ = parse_distrib_release("centos", data);
});
