use hp_common::{
    CapabilityInfo, CpuTimes, Error, ParseError, ProcessArgs, ProcessInfo, ProcessMemoryInfo,
    Result, SeccompInfo, UserInfo,
};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::boot_time;
use crate::parse::{
    parse_capabilities, parse_cmdline, parse_environ, parse_seccomp, parse_stat, parse_status,
    parse_status_memory, process_cpu_times, process_start_time,
};
use crate::providers::unix::{clk_tck, page_size};
use crate::providers::ProcessProvider;

/// One process under `<root>/proc/<pid>`.
#[derive(Debug, Clone)]
pub struct LinuxProcess {
    pid: u32,
    procfs: PathBuf,
    dir: PathBuf,
}

impl LinuxProcess {
    /// Fails with `ProcessNotFound` when `<root>/proc/<pid>` does not exist.
    pub fn open(root: &Path, pid: u32) -> Result<Self> {
        let procfs = root.join("proc");
        let dir = procfs.join(pid.to_string());
        if !dir.is_dir() {
            return Err(Error::ProcessNotFound { pid });
        }
        Ok(Self { pid, procfs, dir })
    }

    fn map_io(&self, path: PathBuf, source: std::io::Error) -> Error {
        match source.kind() {
            ErrorKind::NotFound => Error::ProcessNotFound { pid: self.pid },
            ErrorKind::PermissionDenied => Error::PermissionDenied { pid: self.pid },
            _ => Error::io(path, source),
        }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|source| self.map_io(path, source))
    }

    fn parse<T>(
        &self,
        name: &str,
        parse: impl FnOnce(&[u8]) -> std::result::Result<T, ParseError>,
    ) -> Result<T> {
        let content = self.read(name)?;
        parse(&content).map_err(|err| Error::parse_file(self.dir.join(name), err))
    }

    /// Target of a `/proc/<pid>` symlink, empty when unreadable. Links of
    /// other users' processes need privileges; that is not worth failing
    /// the whole record over.
    fn link(&self, name: &str) -> String {
        match std::fs::read_link(self.dir.join(name)) {
            Ok(target) => target.to_string_lossy().into_owned(),
            Err(err) => {
                debug!(pid = self.pid, link = name, error = %err, "unreadable proc link");
                String::new()
            }
        }
    }
}

impl ProcessProvider for LinuxProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn info(&self) -> Result<ProcessInfo> {
        let status = self.parse("status", parse_status)?;
        let stat = self.parse("stat", parse_stat)?;
        let start_time = boot_time(&self.procfs)
            .ok()
            .and_then(|boot| process_start_time(boot, stat.start_ticks, clk_tck()));

        Ok(ProcessInfo {
            name: status.name,
            pid: self.pid,
            ppid: status.ppid,
            cwd: self.link("cwd"),
            exe: self.link("exe"),
            args: parse_cmdline(&self.read("cmdline")?),
            start_time,
        })
    }

    fn args(&self) -> Result<ProcessArgs> {
        let args = parse_cmdline(&self.read("cmdline")?);
        Ok(ProcessArgs {
            argc: i32::try_from(args.len()).unwrap_or(i32::MAX),
            exe: self.link("exe"),
            args,
            env: self.environment()?,
        })
    }

    fn environment(&self) -> Result<BTreeMap<String, String>> {
        Ok(parse_environ(&self.read("environ")?))
    }

    fn memory(&self) -> Result<ProcessMemoryInfo> {
        let stat = self.parse("stat", parse_stat)?;
        let metrics = self.parse("status", parse_status_memory)?;
        Ok(ProcessMemoryInfo {
            resident: stat.rss_pages.saturating_mul(page_size()),
            virtual_size: stat.vsize,
            metrics,
        })
    }

    fn cpu_time(&self) -> Result<CpuTimes> {
        let stat = self.parse("stat", parse_stat)?;
        Ok(process_cpu_times(&stat, clk_tck()))
    }

    fn user(&self) -> Result<UserInfo> {
        Ok(self.parse("status", parse_status)?.user)
    }

    fn capabilities(&self) -> Result<CapabilityInfo> {
        self.parse("status", parse_capabilities)
    }

    fn seccomp(&self) -> Result<SeccompInfo> {
        self.parse("status", parse_seccomp)
    }
}
