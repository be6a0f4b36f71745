//! Platform backends.
//!
//! [`System`] picks the backend for the compile target. Each backend
//! implements [`HostProvider`] and [`ProcessProvider`]; metrics a platform
//! does not have return [`Error::NotImplemented`].

#[cfg(target_os = "macos")]
pub mod darwin;
#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(unix)]
pub mod unix;

use crate::config::ProbeConfig;
use hp_common::{
    CapabilityInfo, CpuTimes, Error, HostInfo, HostMemoryInfo, LoadAverage, MultiError,
    NetworkCounters, OsInfo, ProcessArgs, ProcessInfo, ProcessMemoryInfo, Result, SeccompInfo,
    UserInfo, VmStatInfo,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A value assembled from several reads, some of which may have failed.
#[derive(Debug)]
pub struct Partial<T> {
    pub value: T,
    pub errors: MultiError,
}

impl<T> Partial<T> {
    /// The value, or `Error::Multiple` if anything failed.
    pub fn into_result(self) -> Result<T> {
        self.errors.into_result().map(|()| self.value)
    }
}

/// Record a failed read and keep going.
pub(crate) fn collect<T>(errors: &mut MultiError, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

pub trait HostProvider {
    /// Identity fields. Every field is attempted; failures are returned
    /// alongside whatever was read.
    fn info(&self) -> Partial<HostInfo>;

    fn os(&self) -> Result<OsInfo>;

    fn cpu_time(&self) -> Result<CpuTimes>;

    fn memory(&self) -> Result<HostMemoryInfo>;

    fn load_average(&self) -> Result<LoadAverage> {
        Err(Error::NotImplemented("load average"))
    }

    fn vmstat(&self) -> Result<VmStatInfo> {
        Err(Error::NotImplemented("vmstat"))
    }

    fn network_counters(&self) -> Result<NetworkCounters> {
        Err(Error::NotImplemented("network counters"))
    }
}

pub trait ProcessProvider {
    fn pid(&self) -> u32;

    fn info(&self) -> Result<ProcessInfo>;

    /// Executable, argv and environment together.
    fn args(&self) -> Result<ProcessArgs>;

    fn environment(&self) -> Result<BTreeMap<String, String>> {
        self.args().map(|args| args.env)
    }

    fn memory(&self) -> Result<ProcessMemoryInfo>;

    fn cpu_time(&self) -> Result<CpuTimes>;

    fn user(&self) -> Result<UserInfo>;

    fn capabilities(&self) -> Result<CapabilityInfo> {
        Err(Error::NotImplemented("capabilities"))
    }

    fn seccomp(&self) -> Result<SeccompInfo> {
        Err(Error::NotImplemented("seccomp"))
    }
}

/// Entry point: one backend per compile target.
#[derive(Debug, Clone, Default)]
pub struct System {
    config: ProbeConfig,
}

impl System {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    #[cfg(target_os = "linux")]
    pub fn host(&self) -> Result<Box<dyn HostProvider>> {
        Ok(Box::new(linux::LinuxHost::new(self.config.root())))
    }

    #[cfg(target_os = "linux")]
    pub fn process(&self, pid: u32) -> Result<Box<dyn ProcessProvider>> {
        Ok(Box::new(linux::LinuxProcess::open(self.config.root(), pid)?))
    }

    #[cfg(target_os = "macos")]
    pub fn host(&self) -> Result<Box<dyn HostProvider>> {
        Ok(Box::new(darwin::DarwinHost))
    }

    #[cfg(target_os = "macos")]
    pub fn process(&self, pid: u32) -> Result<Box<dyn ProcessProvider>> {
        Ok(Box::new(darwin::DarwinProcess::open(pid)?))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub fn host(&self) -> Result<Box<dyn HostProvider>> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    pub fn process(&self, _pid: u32) -> Result<Box<dyn ProcessProvider>> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// The calling process.
    pub fn self_process(&self) -> Result<Box<dyn ProcessProvider>> {
        self.process(std::process::id())
    }
}

/// Everything `hostprobe host` prints.
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub info: HostInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuTimes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<HostMemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<LoadAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmstat: Option<VmStatInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkCounters>,
}

/// Read every host metric, collecting failures.
pub fn host_report(host: &dyn HostProvider) -> Partial<HostReport> {
    let Partial {
        value: info,
        mut errors,
    } = host.info();

    let report = HostReport {
        info,
        cpu: collect(&mut errors, host.cpu_time()),
        memory: collect(&mut errors, host.memory()),
        load_average: collect(&mut errors, host.load_average()),
        vmstat: collect(&mut errors, host.vmstat()),
        network: collect(&mut errors, host.network_counters()),
    };
    Partial {
        value: report,
        errors,
    }
}

/// Everything `hostprobe process` prints.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ProcessInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<ProcessMemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuTimes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilityInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seccomp: Option<SeccompInfo>,
}

/// Read every process metric, collecting failures. The environment is read
/// only when `with_env` is set.
pub fn process_report(process: &dyn ProcessProvider, with_env: bool) -> Partial<ProcessReport> {
    let mut errors = MultiError::new();
    let report = ProcessReport {
        pid: process.pid(),
        info: collect(&mut errors, process.info()),
        env: if with_env {
            collect(&mut errors, process.environment())
        } else {
            None
        },
        memory: collect(&mut errors, process.memory()),
        cpu: collect(&mut errors, process.cpu_time()),
        user: collect(&mut errors, process.user()),
        capabilities: collect(&mut errors, process.capabilities()),
        seccomp: collect(&mut errors, process.seccomp()),
    };
    Partial {
        value: report,
        errors,
    }
}
