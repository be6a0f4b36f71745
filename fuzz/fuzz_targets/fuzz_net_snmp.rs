//! Fuzz target for the header/value tables of `/proc/net/snmp`,
//! `/proc/net/netstat` and the single-line `/proc/vmstat`.

#![no_main]

use hp_core::parse::{
    parse_dual_line_tabular, parse_tabular, project_netstat, project_snmp, project_vmstat,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = parse_dual_line_tabular(data) {
        let _ = project_snmp(&table);
        let _ = project_netstat(&table);
    }
    if let Ok(table) = parse_tabular(data) {
        let _ = project_vmstat(&table);
    }
});
