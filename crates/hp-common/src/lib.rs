//! hostprobe common types and errors.
//!
//! This crate provides the records shared between the parsers, the platform
//! providers, and the CLI:
//! - Host records (OS identity, memory, CPU times, network counters)
//! - Process records (arguments, capabilities, seccomp)
//! - The error taxonomy
//! - Output format selection

pub mod error;
pub mod host;
pub mod output;
pub mod process;

pub use error::{
    format_error_human, Error, ErrorCategory, MultiError, ParseError, Result, StructuredError,
};
pub use host::{
    CpuTimes, HostInfo, HostMemoryInfo, LoadAverage, MetricTable, Netstat, NetworkCounters,
    OsInfo, SectionTable, Snmp, VmStatInfo,
};
pub use output::OutputFormat;
pub use process::{
    CapabilityInfo, ProcessArgs, ProcessInfo, ProcessMemoryInfo, SeccompInfo, UserInfo,
};
