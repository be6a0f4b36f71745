//! hostprobe core library
//!
//! This library reads host and process information from system files and
//! kernel interfaces:
//! - Pure parsers for procfs, os-release and binary argument blobs
//! - Platform providers (Linux procfs, macOS sysctl/libproc)
//! - Configuration loading and logging setup
//! - Exit codes for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod parse;
pub mod providers;

pub use config::{load_config, ConfigError, ConfigOptions, ProbeConfig};
pub use providers::{
    host_report, process_report, HostProvider, HostReport, Partial, ProcessProvider,
    ProcessReport, System,
};
