use chrono::{DateTime, Utc};
use hp_common::{
    CpuTimes, Error, HostInfo, HostMemoryInfo, LoadAverage, MetricTable, MultiError, OsInfo,
    ParseError, Result,
};
use std::path::Path;

use super::{sysctl_by_name, sysctl_string, sysctl_u64};
use crate::parse::version_components;
use crate::providers::unix::{local_timezone, page_size, Uname};
use crate::providers::{collect, HostProvider, Partial};

/// Host metrics from sysctl.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarwinHost;

fn boot_time() -> Result<DateTime<Utc>> {
    // struct timeval { time_t tv_sec; suseconds_t tv_usec; }
    let buf = sysctl_by_name("kern.boottime")?;
    let (Some(sec), Some(usec)) = (buf.first_chunk::<8>(), buf.get(8..12)) else {
        return Err(ParseError::TruncatedHeader { len: buf.len() }.into());
    };
    let sec = i64::from_ne_bytes(*sec);
    let usec = i32::from_ne_bytes([usec[0], usec[1], usec[2], usec[3]]);
    let nanos = u32::try_from(usec).unwrap_or(0).saturating_mul(1000);
    DateTime::from_timestamp(sec, nanos).ok_or(Error::Parse(ParseError::InvalidNumber {
        value: sec.to_string(),
    }))
}

fn machine_id() -> Result<String> {
    let id = sysctl_string("kern.uuid")?;
    if id.is_empty() {
        return Err(ParseError::EmptyValue.into());
    }
    Ok(id)
}

/// Total, available and used swap from `vm.swapusage` (`struct xsw_usage`).
fn swap_usage() -> Result<(u64, u64, u64)> {
    let buf = sysctl_by_name("vm.swapusage")?;
    let word = |i: usize| {
        buf.get(i * 8..i * 8 + 8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_ne_bytes)
    };
    match (word(0), word(1), word(2)) {
        (Some(total), Some(avail), Some(used)) => Ok((total, avail, used)),
        _ => Err(ParseError::TruncatedHeader { len: buf.len() }.into()),
    }
}

impl HostProvider for DarwinHost {
    fn info(&self) -> Partial<HostInfo> {
        let mut errors = MultiError::new();
        let mut info = HostInfo::default();

        if let Some(uname) = collect(&mut errors, Uname::read()) {
            info.architecture = uname.machine;
            info.hostname = uname.nodename;
            info.kernel_version = uname.release;
        }
        info.boot_time = collect(&mut errors, boot_time());
        info.os = collect(&mut errors, self.os());
        (info.timezone, info.timezone_offset_sec) = local_timezone(Path::new("/etc/localtime"));
        info.unique_id = collect(&mut errors, machine_id()).unwrap_or_default();

        Partial {
            value: info,
            errors,
        }
    }

    fn os(&self) -> Result<OsInfo> {
        let version = sysctl_string("kern.osproductversion")?;
        let (major, minor, patch) = version_components(&version);
        Ok(OsInfo {
            os_type: "macos".to_string(),
            family: "darwin".to_string(),
            platform: "darwin".to_string(),
            name: "macOS".to_string(),
            version,
            major,
            minor,
            patch,
            build: sysctl_string("kern.osversion").unwrap_or_default(),
            codename: String::new(),
        })
    }

    fn cpu_time(&self) -> Result<CpuTimes> {
        Err(Error::NotImplemented("host cpu time"))
    }

    fn memory(&self) -> Result<HostMemoryInfo> {
        let total = sysctl_u64("hw.memsize")?;
        let page = page_size();
        let free = sysctl_u64("vm.page_free_count")?.saturating_mul(page);
        let purgeable = sysctl_u64("vm.page_purgeable_count")
            .unwrap_or(0)
            .saturating_mul(page);
        let (swap_total, swap_free, swap_used) = swap_usage()?;

        let mut metrics = MetricTable::new();
        metrics.insert("purgeable".to_string(), purgeable);

        Ok(HostMemoryInfo {
            total,
            used: total.saturating_sub(free),
            available: free.saturating_add(purgeable),
            free,
            virtual_total: swap_total,
            virtual_used: swap_used,
            virtual_free: swap_free,
            metrics,
        })
    }

    fn load_average(&self) -> Result<LoadAverage> {
        let mut loads = [0f64; 3];
        // SAFETY: loads has room for the 3 samples requested.
        let n = unsafe { libc::getloadavg(loads.as_mut_ptr(), 3) };
        if n != 3 {
            return Err(Error::Syscall {
                call: "getloadavg",
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(LoadAverage {
            one: loads[0],
            five: loads[1],
            fifteen: loads[2],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_info() {
        let partial = DarwinHost.info();
        let info = partial.value;
        assert!(info.boot_time.is_some());
        let os = info.os.unwrap();
        assert_eq!(os.family, "darwin");
        assert!(os.major >= 10);
    }

    #[test]
    fn test_memory() {
        let memory = DarwinHost.memory().unwrap();
        assert!(memory.total > 0);
        assert!(memory.free <= memory.total);
    }

    #[test]
    fn test_cpu_time_not_implemented() {
        assert!(DarwinHost.cpu_time().unwrap_err().is_not_implemented());
    }
}
