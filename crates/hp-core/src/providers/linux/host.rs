use hp_common::{
    CpuTimes, Error, HostInfo, HostMemoryInfo, LoadAverage, MultiError, NetworkCounters, OsInfo,
    Result, VmStatInfo,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{boot_time, parse_file, read_file};
use crate::parse::{
    identify_distribution, is_containerized_cgroup, parse_cpu_times, parse_dual_line_tabular,
    parse_loadavg, parse_meminfo, parse_tabular, project_netstat, project_snmp, project_vmstat,
};
use crate::providers::unix::{clk_tck, local_timezone, Uname};
use crate::providers::{collect, HostProvider, Partial};

/// Current and historic machine-id locations, searched in order.
const MACHINE_ID_FILES: [&str; 3] = [
    "etc/machine-id",
    "var/lib/dbus/machine-id",
    "var/db/dbus/machine-id",
];

/// Host metrics from `<root>/proc` and `<root>/etc`.
#[derive(Debug, Clone)]
pub struct LinuxHost {
    root: PathBuf,
    procfs: PathBuf,
}

impl LinuxHost {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            procfs: root.join("proc"),
        }
    }

    fn proc_path(&self, rel: &str) -> PathBuf {
        self.procfs.join(rel)
    }

    /// Whether PID 1 of the probed root lives in a container cgroup.
    pub fn containerized(&self) -> Result<bool> {
        let content = read_file(&self.proc_path("1/cgroup"))?;
        Ok(is_containerized_cgroup(&content))
    }

    /// First machine-id file found. No file at all is `NotImplemented`;
    /// any other read failure is an error.
    pub fn machine_id(&self) -> Result<String> {
        for rel in MACHINE_ID_FILES {
            let path = self.root.join(rel);
            match std::fs::read(&path) {
                Ok(content) => return Ok(String::from_utf8_lossy(content.trim_ascii()).into_owned()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(Error::io(&path, source)),
            }
        }
        Err(Error::NotImplemented("machine id"))
    }
}

impl HostProvider for LinuxHost {
    fn info(&self) -> Partial<HostInfo> {
        let mut errors = MultiError::new();
        let mut info = HostInfo::default();

        if let Some(uname) = collect(&mut errors, Uname::read()) {
            info.architecture = uname.machine;
            info.hostname = uname.nodename;
            info.kernel_version = uname.release;
        }
        info.boot_time = collect(&mut errors, boot_time(&self.procfs));
        info.containerized = collect(&mut errors, self.containerized());
        info.os = collect(&mut errors, self.os());
        (info.timezone, info.timezone_offset_sec) = local_timezone(&self.root.join("etc/localtime"));
        info.unique_id = collect(&mut errors, self.machine_id()).unwrap_or_default();

        if !errors.is_empty() {
            debug!(failed = errors.len(), "host info partially collected");
        }
        Partial {
            value: info,
            errors,
        }
    }

    fn os(&self) -> Result<OsInfo> {
        Ok(identify_distribution(&[&self.root])?)
    }

    fn cpu_time(&self) -> Result<CpuTimes> {
        parse_file(&self.proc_path("stat"), |content| {
            parse_cpu_times(content, clk_tck())
        })
    }

    fn memory(&self) -> Result<HostMemoryInfo> {
        parse_file(&self.proc_path("meminfo"), parse_meminfo)
    }

    fn load_average(&self) -> Result<LoadAverage> {
        parse_file(&self.proc_path("loadavg"), parse_loadavg)
    }

    fn vmstat(&self) -> Result<VmStatInfo> {
        let table = parse_file(&self.proc_path("vmstat"), parse_tabular)?;
        Ok(project_vmstat(&table))
    }

    fn network_counters(&self) -> Result<NetworkCounters> {
        let snmp = parse_file(&self.proc_path("net/snmp"), parse_dual_line_tabular)?;
        let netstat = parse_file(&self.proc_path("net/netstat"), parse_dual_line_tabular)?;
        Ok(NetworkCounters {
            snmp: project_snmp(&snmp),
            netstat: project_netstat(&netstat),
        })
    }
}
