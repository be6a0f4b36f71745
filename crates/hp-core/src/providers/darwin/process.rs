use chrono::DateTime;
use hp_common::{CpuTimes, Error, ProcessArgs, ProcessInfo, ProcessMemoryInfo, Result, UserInfo};
use libc::{c_int, c_void};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use super::sysctl_mib;
use crate::parse::decode_procargs;
use crate::providers::ProcessProvider;

const PROC_PIDTASKINFO: c_int = 4;
const PROC_PIDTBSDINFO: c_int = 3;
const MAXCOMLEN: usize = 16;

/// `struct proc_bsdinfo` from `<sys/proc_info.h>`.
#[repr(C)]
#[allow(dead_code)]
struct ProcBsdInfo {
    pbi_flags: u32,
    pbi_status: u32,
    pbi_xstatus: u32,
    pbi_pid: u32,
    pbi_ppid: u32,
    pbi_uid: libc::uid_t,
    pbi_gid: libc::gid_t,
    pbi_ruid: libc::uid_t,
    pbi_rgid: libc::gid_t,
    pbi_svuid: libc::uid_t,
    pbi_svgid: libc::gid_t,
    rfu_1: u32,
    pbi_comm: [u8; MAXCOMLEN],
    pbi_name: [u8; 2 * MAXCOMLEN],
    pbi_nfiles: u32,
    pbi_pgid: u32,
    pbi_pjobc: u32,
    e_tdev: u32,
    e_tpgid: u32,
    pbi_nice: i32,
    pbi_start_tvsec: u64,
    pbi_start_tvusec: u64,
}

/// `struct proc_taskinfo` from `<sys/proc_info.h>`.
#[repr(C)]
#[allow(dead_code)]
struct ProcTaskInfo {
    pti_virtual_size: u64,
    pti_resident_size: u64,
    pti_total_user: u64,
    pti_total_system: u64,
    pti_threads_user: u64,
    pti_threads_system: u64,
    pti_policy: i32,
    pti_faults: i32,
    pti_pageins: i32,
    pti_cow_faults: i32,
    pti_messages_sent: i32,
    pti_messages_received: i32,
    pti_syscalls_mach: i32,
    pti_syscalls_unix: i32,
    pti_csw: i32,
    pti_threadnum: i32,
    pti_numrunning: i32,
    pti_priority: i32,
}

#[repr(C)]
struct MachTimebaseInfo {
    numer: u32,
    denom: u32,
}

extern "C" {
    fn proc_pidinfo(
        pid: c_int,
        flavor: c_int,
        arg: u64,
        buffer: *mut c_void,
        buffersize: c_int,
    ) -> c_int;

    fn mach_timebase_info(info: *mut MachTimebaseInfo) -> c_int;
}

/// Task times are in Mach absolute units (1:1 with ns on Intel, not on
/// Apple silicon).
fn mach_to_duration(ticks: u64) -> Duration {
    static FACTOR: OnceLock<(u64, u64)> = OnceLock::new();
    let (numer, denom) = *FACTOR.get_or_init(|| {
        let mut info = MachTimebaseInfo { numer: 0, denom: 0 };
        // SAFETY: info is a valid out-pointer.
        let ret = unsafe { mach_timebase_info(&mut info) };
        if ret == 0 && info.denom != 0 {
            (u64::from(info.numer), u64::from(info.denom))
        } else {
            (1, 1)
        }
    });
    let nanos = u128::from(ticks) * u128::from(numer) / u128::from(denom);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn cstr_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// One process, addressed by pid.
#[derive(Debug, Clone, Copy)]
pub struct DarwinProcess {
    pid: u32,
}

impl DarwinProcess {
    pub fn open(pid: u32) -> Result<Self> {
        let process = Self { pid };
        process.bsd_info()?;
        Ok(process)
    }

    fn c_pid(&self) -> Result<c_int> {
        c_int::try_from(self.pid).map_err(|_| Error::ProcessNotFound { pid: self.pid })
    }

    /// proc_pidinfo reports a vanished process as ESRCH or, for some
    /// flavors, with no errno at all.
    fn pidinfo_error(&self) -> Error {
        match std::io::Error::last_os_error().raw_os_error() {
            Some(libc::EPERM) | Some(libc::EACCES) => Error::PermissionDenied { pid: self.pid },
            _ => Error::ProcessNotFound { pid: self.pid },
        }
    }

    fn pidinfo<T>(&self, flavor: c_int, call: &'static str) -> Result<T> {
        let pid = self.c_pid()?;
        let mut info = std::mem::MaybeUninit::<T>::zeroed();
        let size = c_int::try_from(std::mem::size_of::<T>()).map_err(|_| Error::NotImplemented(call))?;
        // SAFETY: info has room for one T; the kernel writes at most `size` bytes.
        let written =
            unsafe { proc_pidinfo(pid, flavor, 0, info.as_mut_ptr() as *mut c_void, size) };
        if written <= 0 {
            return Err(self.pidinfo_error());
        }
        if written < size {
            return Err(Error::Syscall {
                call,
                source: std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
            });
        }
        // SAFETY: the struct was zeroed and fully written; all fields are plain integers.
        Ok(unsafe { info.assume_init() })
    }

    fn bsd_info(&self) -> Result<ProcBsdInfo> {
        self.pidinfo(PROC_PIDTBSDINFO, "proc_pidinfo(PROC_PIDTBSDINFO)")
    }

    fn task_info(&self) -> Result<ProcTaskInfo> {
        self.pidinfo(PROC_PIDTASKINFO, "proc_pidinfo(PROC_PIDTASKINFO)")
    }

    fn procargs(&self) -> Result<ProcessArgs> {
        let mut mib = [libc::CTL_KERN, libc::KERN_PROCARGS2, self.c_pid()?];
        let buf = sysctl_mib(&mut mib, "sysctl(KERN_PROCARGS2)").map_err(|err| match err {
            Error::Syscall { ref source, .. } if source.raw_os_error() == Some(libc::EINVAL) => {
                // EINVAL is what the kernel returns for processes we may not inspect.
                Error::PermissionDenied { pid: self.pid }
            }
            other => other,
        })?;
        Ok(decode_procargs(&buf)?)
    }
}

impl ProcessProvider for DarwinProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn info(&self) -> Result<ProcessInfo> {
        let bsd = self.bsd_info()?;
        let name = if bsd.pbi_name[0] != 0 {
            cstr_field(&bsd.pbi_name)
        } else {
            cstr_field(&bsd.pbi_comm)
        };
        let start_time = i64::try_from(bsd.pbi_start_tvsec).ok().and_then(|secs| {
            let nanos = u32::try_from(bsd.pbi_start_tvusec.saturating_mul(1000)).unwrap_or(0);
            DateTime::from_timestamp(secs, nanos)
        });

        let (exe, args) = match self.procargs() {
            Ok(procargs) => (procargs.exe, procargs.args),
            Err(err) => {
                debug!(pid = self.pid, error = %err, "arguments unavailable");
                (String::new(), Vec::new())
            }
        };

        Ok(ProcessInfo {
            name,
            pid: self.pid,
            ppid: bsd.pbi_ppid,
            cwd: String::new(),
            exe,
            args,
            start_time,
        })
    }

    fn args(&self) -> Result<ProcessArgs> {
        self.procargs()
    }

    fn memory(&self) -> Result<ProcessMemoryInfo> {
        let task = self.task_info()?;
        Ok(ProcessMemoryInfo {
            resident: task.pti_resident_size,
            virtual_size: task.pti_virtual_size,
            metrics: Default::default(),
        })
    }

    fn cpu_time(&self) -> Result<CpuTimes> {
        let task = self.task_info()?;
        Ok(CpuTimes {
            user: mach_to_duration(task.pti_total_user),
            system: mach_to_duration(task.pti_total_system),
            ..Default::default()
        })
    }

    fn user(&self) -> Result<UserInfo> {
        let bsd = self.bsd_info()?;
        Ok(UserInfo {
            uid: bsd.pbi_ruid.to_string(),
            euid: bsd.pbi_uid.to_string(),
            suid: bsd.pbi_svuid.to_string(),
            gid: bsd.pbi_rgid.to_string(),
            egid: bsd.pbi_gid.to_string(),
            sgid: bsd.pbi_svgid.to_string(),
        })
    }
}
