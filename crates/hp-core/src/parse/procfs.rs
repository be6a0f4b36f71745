//! Parsers for Linux procfs files, built on the generic line parsers.
//!
//! # Files Parsed
//! - `/proc/meminfo` - host memory
//! - `/proc/loadavg` - load average
//! - `/proc/stat` - aggregate CPU times and boot time
//! - `/proc/1/cgroup` - containerization heuristic
//! - `/proc/[pid]/status` - name, ppid, ids, capabilities, seccomp
//! - `/proc/[pid]/stat` - start time, CPU times, memory sizes

use chrono::{DateTime, Utc};
use hp_common::{
    CapabilityInfo, CpuTimes, HostMemoryInfo, LoadAverage, MetricTable, ParseError, SeccompInfo,
    UserInfo,
};
use std::collections::BTreeMap;
use std::time::Duration;

use super::bitmask::{capability_name, decode_bitmask};
use super::keyvalue::{find_value, parse_key_value};
use super::quantity::{invalid_number, parse_quantity, parse_u64};

/// Parse `/proc/meminfo` into byte counts.
///
/// `available` falls back to `MemFree + Buffers + Cached` on kernels that
/// predate `MemAvailable`. Keys not mapped to a field land in `metrics`.
pub fn parse_meminfo(content: &[u8]) -> Result<HostMemoryInfo, ParseError> {
    let mut metrics = MetricTable::new();
    parse_key_value(content, b':', |key, value| {
        metrics.insert(String::from_utf8_lossy(key).into_owned(), parse_quantity(value)?);
        Ok(())
    })?;

    let mut take = |key: &str| metrics.remove(key);
    let total = take("MemTotal").unwrap_or(0);
    let free = take("MemFree").unwrap_or(0);
    let available = take("MemAvailable");
    let swap_total = take("SwapTotal").unwrap_or(0);
    let swap_free = take("SwapFree").unwrap_or(0);

    let available = available.unwrap_or_else(|| {
        ["Buffers", "Cached"]
            .iter()
            .filter_map(|key| metrics.get(*key))
            .fold(free, |sum, v| sum.saturating_add(*v))
    });

    Ok(HostMemoryInfo {
        total,
        used: total.saturating_sub(free),
        available,
        free,
        virtual_total: swap_total,
        virtual_used: swap_total.saturating_sub(swap_free),
        virtual_free: swap_free,
        metrics,
    })
}

/// Parse the first three fields of `/proc/loadavg`.
pub fn parse_loadavg(content: &[u8]) -> Result<LoadAverage, ParseError> {
    let text = String::from_utf8_lossy(content);
    let mut fields = text.split_whitespace().map(|field| {
        field
            .parse::<f64>()
            .map_err(|_| invalid_number(field.as_bytes()))
    });
    let mut next = || fields.next().unwrap_or(Err(ParseError::EmptyValue));

    Ok(LoadAverage {
        one: next()?,
        five: next()?,
        fifteen: next()?,
    })
}

fn ticks_to_duration(ticks: u64, ticks_per_sec: u64) -> Duration {
    let tps = ticks_per_sec.max(1);
    Duration::from_secs(ticks / tps) + Duration::from_nanos((ticks % tps) * 1_000_000_000 / tps)
}

/// Aggregate `cpu` line of `/proc/stat`. Counters are in clock ticks.
pub fn parse_cpu_times(content: &[u8], ticks_per_sec: u64) -> Result<CpuTimes, ParseError> {
    let line = find_value(content, b' ', "cpu").ok_or(ParseError::EmptyValue)?;
    let mut counters = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .map(parse_u64);
    let mut next = || -> Result<Duration, ParseError> {
        // Older kernels stop before iowait/irq/softirq/steal.
        let ticks = counters.next().transpose()?.unwrap_or(0);
        Ok(ticks_to_duration(ticks, ticks_per_sec))
    };

    let user = next()?;
    let nice = next()?;
    let system = next()?;
    let idle = next()?;
    let iowait = next()?;
    let irq = next()?;
    let soft_irq = next()?;
    let steal = next()?;

    Ok(CpuTimes {
        user,
        system,
        idle,
        iowait,
        irq,
        nice,
        soft_irq,
        steal,
    })
}

/// Boot time from the `btime` line of `/proc/stat`.
pub fn parse_boot_time(content: &[u8]) -> Result<DateTime<Utc>, ParseError> {
    let value = find_value(content, b' ', "btime").ok_or(ParseError::EmptyValue)?;
    let secs = parse_u64(value)?;
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| invalid_number(value))
}

/// Guess from `/proc/1/cgroup` whether we run inside a container.
///
/// Root-path entries (`.../`) say nothing. Any `init.scope` entry means PID 1
/// is the host's systemd. Otherwise PID 1 living in a named, non-root cgroup
/// means a container; no informative entries at all means not containerized.
pub fn is_containerized_cgroup(content: &[u8]) -> bool {
    let mut informative = false;
    for line in content.split(|&b| b == b'\n').map(<[u8]>::trim_ascii) {
        if line.is_empty() || line.ends_with(b"/") {
            continue;
        }
        if line.ends_with(b"init.scope") {
            return false;
        }
        informative = true;
    }
    informative
}

/// Capability sets from `/proc/[pid]/status`.
pub fn parse_capabilities(content: &[u8]) -> Result<CapabilityInfo, ParseError> {
    let mut caps = CapabilityInfo::default();
    parse_key_value(content, b':', |key, value| {
        let target = match key {
            b"CapInh" => &mut caps.inheritable,
            b"CapPrm" => &mut caps.permitted,
            b"CapEff" => &mut caps.effective,
            b"CapBnd" => &mut caps.bounding,
            b"CapAmb" => &mut caps.ambient,
            _ => return Ok(()),
        };
        *target = decode_bitmask(&String::from_utf8_lossy(value), capability_name)?;
        Ok(())
    })?;
    Ok(caps)
}

/// Name of a seccomp mode number.
pub fn seccomp_mode_name(mode: u8) -> String {
    match mode {
        0 => "disabled".to_string(),
        1 => "strict".to_string(),
        2 => "filter".to_string(),
        other => other.to_string(),
    }
}

/// `Seccomp` and `NoNewPrivs` from `/proc/[pid]/status`.
///
/// Fails when the kernel does not report `Seccomp`; `no_new_privs` is `None`
/// when its line is missing or unreadable.
pub fn parse_seccomp(content: &[u8]) -> Result<SeccompInfo, ParseError> {
    let raw = find_value(content, b':', "Seccomp").ok_or(ParseError::EmptyValue)?;
    let mode = std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or_else(|| invalid_number(raw))?;

    let no_new_privs = find_value(content, b':', "NoNewPrivs").and_then(|v| match v {
        b"0" => Some(false),
        b"1" => Some(true),
        _ => None,
    });

    Ok(SeccompInfo {
        mode: seccomp_mode_name(mode),
        no_new_privs,
    })
}

/// Fields of `/proc/[pid]/status` used for process info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub name: String,
    pub ppid: u32,
    pub user: UserInfo,
}

/// Parse `/proc/[pid]/status`. `Uid`/`Gid` lines are real, effective,
/// saved, filesystem.
pub fn parse_status(content: &[u8]) -> Result<ProcStatus, ParseError> {
    let mut status = ProcStatus::default();
    parse_key_value(content, b':', |key, value| {
        let text = || String::from_utf8_lossy(value);
        match key {
            b"Name" => status.name = text().into_owned(),
            b"PPid" => {
                status.ppid = u32::try_from(parse_u64(value)?).map_err(|_| invalid_number(value))?
            }
            b"Uid" | b"Gid" => {
                let ids: Vec<String> = text().split_whitespace().map(str::to_string).collect();
                let id = |i: usize| ids.get(i).cloned().unwrap_or_default();
                let user = &mut status.user;
                if key == b"Uid" {
                    (user.uid, user.euid, user.suid) = (id(0), id(1), id(2));
                } else {
                    (user.gid, user.egid, user.sgid) = (id(0), id(1), id(2));
                }
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(status)
}

/// `Vm*` and `Rss*` lines of `/proc/[pid]/status`, in bytes.
pub fn parse_status_memory(content: &[u8]) -> Result<MetricTable, ParseError> {
    let mut metrics = MetricTable::new();
    parse_key_value(content, b':', |key, value| {
        if key.starts_with(b"Vm") || key.starts_with(b"Rss") {
            metrics.insert(String::from_utf8_lossy(key).into_owned(), parse_quantity(value)?);
        }
        Ok(())
    })?;
    Ok(metrics)
}

fn nul_separated(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let content = content.strip_suffix(b"\0").unwrap_or(content);
    content
        .split(|&b| b == 0)
        .filter(move |_| !content.is_empty())
}

/// Split `/proc/[pid]/cmdline`. Empty arguments in the middle are kept.
pub fn parse_cmdline(content: &[u8]) -> Vec<String> {
    nul_separated(content)
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}

/// Parse `/proc/[pid]/environ`.
///
/// Entries without `=` are skipped (a process may have rewritten its
/// environment block). The first occurrence of a key wins.
pub fn parse_environ(content: &[u8]) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for entry in nul_separated(content) {
        if let Some(eq) = entry.iter().position(|&b| b == b'=') {
            env.entry(String::from_utf8_lossy(&entry[..eq]).into_owned())
                .or_insert_with(|| String::from_utf8_lossy(&entry[eq + 1..]).into_owned());
        }
    }
    env
}

/// Fields of `/proc/[pid]/stat` used for process info.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStat {
    pub ppid: u32,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub start_ticks: u64,
    pub vsize: u64,
    pub rss_pages: u64,
}

/// Parse `/proc/[pid]/stat`.
///
/// The command name is parenthesized and may itself contain spaces and
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &[u8]) -> Result<ProcStat, ParseError> {
    let close = content
        .iter()
        .rposition(|&b| b == b')')
        .ok_or(ParseError::MalformedLine {
            line: 1,
            separator: ')',
        })?;
    let rest = content.get(close + 1..).unwrap_or_default();
    let fields: Vec<&[u8]> = rest
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    // fields[0] is the state (field 3 in proc(5) numbering).
    let field = |n: usize| -> Result<u64, ParseError> {
        let token = fields.get(n - 3).ok_or(ParseError::EmptyValue)?;
        parse_u64(token)
    };

    Ok(ProcStat {
        ppid: u32::try_from(field(4)?).unwrap_or(0),
        utime_ticks: field(14)?,
        stime_ticks: field(15)?,
        start_ticks: field(22)?,
        vsize: field(23)?,
        rss_pages: field(24)?,
    })
}

/// Process CPU time from `/proc/[pid]/stat` counters.
pub fn process_cpu_times(stat: &ProcStat, ticks_per_sec: u64) -> CpuTimes {
    CpuTimes {
        user: ticks_to_duration(stat.utime_ticks, ticks_per_sec),
        system: ticks_to_duration(stat.stime_ticks, ticks_per_sec),
        ..Default::default()
    }
}

/// Absolute process start time from boot time and `starttime` ticks.
pub fn process_start_time(
    boot_time: DateTime<Utc>,
    start_ticks: u64,
    ticks_per_sec: u64,
) -> Option<DateTime<Utc>> {
    let offset = chrono::Duration::from_std(ticks_to_duration(start_ticks, ticks_per_sec)).ok()?;
    boot_time.checked_add_signed(offset)
}
