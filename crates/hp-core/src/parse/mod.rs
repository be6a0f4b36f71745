//! Pure parsers for host information files.
//!
//! Everything here works on byte slices already read into memory. Nothing in
//! this module touches the filesystem except [`os_release::identify_distribution`],
//! which only reads the release files under the roots it is given.

pub mod bitmask;
pub mod keyvalue;
pub mod os_release;
pub mod procargs;
pub mod procfs;
pub mod projection;
pub mod quantity;
pub mod tabular;

pub use bitmask::{capability_name, decode_bitmask, CAPABILITY_NAMES};
pub use keyvalue::{find_value, parse_key_value, KeyValueParser};
pub use os_release::{
    identify_distribution, linux_family, parse_distrib_release, parse_os_release,
    version_components,
};
pub use procargs::{decode_procargs, encode_procargs};
pub use procfs::{
    is_containerized_cgroup, parse_boot_time, parse_capabilities, parse_cpu_times, parse_loadavg,
    parse_cmdline, parse_environ, parse_meminfo, parse_seccomp, parse_stat, parse_status,
    parse_status_memory, process_cpu_times, process_start_time, ProcStat, ProcStatus,
};
pub use projection::{project_netstat, project_snmp, project_vmstat, FieldTable};
pub use quantity::{parse_quantity, parse_u64};
pub use tabular::{parse_dual_line_tabular, parse_tabular};
