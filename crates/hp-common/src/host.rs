//! Host-level records.
//!
//! Field names in the serialized form are a compatibility surface: consumers
//! key on `boot_time`, `kernel_version`, `one_min` and so on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metric name to value, as produced by the tabular parsers.
pub type MetricTable = BTreeMap<String, u64>;

/// Section name (`Tcp`, `IpExt`, ...) to its metrics.
pub type SectionTable = BTreeMap<String, MetricTable>;

/// Static description of the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Hardware architecture (e.g. x86_64, aarch64).
    pub architecture: String,
    pub boot_time: Option<DateTime<Utc>>,
    /// Whether the probing process runs inside a container. `None` when
    /// it could not be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containerized: Option<bool>,
    pub hostname: String,
    pub kernel_version: String,
    pub os: Option<OsInfo>,
    pub timezone: String,
    /// Offset from UTC in seconds.
    pub timezone_offset_sec: i32,
    /// Machine id (`/etc/machine-id` on Linux, hardware UUID on macOS).
    #[serde(default, rename = "id", skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
}

/// Operating system identity.
///
/// `major`/`minor`/`patch` are 0 whenever the version text does not carry
/// that component as a plain integer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    /// OS type (linux, darwin, ...).
    #[serde(rename = "type")]
    pub os_type: String,
    /// OS family (redhat, debian, suse, arch, alpine, darwin).
    pub family: String,
    /// OS platform (centos, ubuntu, darwin, ...).
    pub platform: String,
    /// Human name (e.g. "CentOS Linux", "macOS").
    pub name: String,
    /// Version as printed by the OS (e.g. "7 (Core)").
    pub version: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub codename: String,
}

/// Aggregate CPU time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuTimes {
    #[serde(with = "duration_nanos")]
    pub user: Duration,
    #[serde(with = "duration_nanos")]
    pub system: Duration,
    #[serde(default, with = "duration_nanos")]
    pub idle: Duration,
    #[serde(default, with = "duration_nanos")]
    pub iowait: Duration,
    #[serde(default, with = "duration_nanos")]
    pub irq: Duration,
    #[serde(default, with = "duration_nanos")]
    pub nice: Duration,
    #[serde(default, with = "duration_nanos")]
    pub soft_irq: Duration,
    #[serde(default, with = "duration_nanos")]
    pub steal: Duration,
}

impl CpuTimes {
    /// Sum of every counter.
    pub fn total(&self) -> Duration {
        self.user
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.nice
            + self.soft_irq
            + self.steal
    }
}

/// Host memory usage in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMemoryInfo {
    #[serde(rename = "total_bytes")]
    pub total: u64,
    #[serde(rename = "used_bytes")]
    pub used: u64,
    #[serde(rename = "available_bytes")]
    pub available: u64,
    #[serde(rename = "free_bytes")]
    pub free: u64,
    #[serde(rename = "virtual_total_bytes")]
    pub virtual_total: u64,
    #[serde(rename = "virtual_used_bytes")]
    pub virtual_used: u64,
    #[serde(rename = "virtual_free_bytes")]
    pub virtual_free: u64,
    /// Every other metric the source reported.
    #[serde(default, rename = "raw", skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: MetricTable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    #[serde(rename = "one_min")]
    pub one: f64,
    #[serde(rename = "five_min")]
    pub five: f64,
    #[serde(rename = "fifteen_min")]
    pub fifteen: f64,
}

/// Selected `/proc/vmstat` counters.
///
/// Counters the kernel does not report stay at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmStatInfo {
    pub nr_free_pages: u64,
    pub nr_inactive_anon: u64,
    pub nr_active_anon: u64,
    pub nr_inactive_file: u64,
    pub nr_active_file: u64,
    pub nr_unevictable: u64,
    pub nr_mlock: u64,
    pub nr_anon_pages: u64,
    pub nr_mapped: u64,
    pub nr_file_pages: u64,
    pub nr_dirty: u64,
    pub nr_writeback: u64,
    pub nr_slab_reclaimable: u64,
    pub nr_slab_unreclaimable: u64,
    pub nr_page_table_pages: u64,
    pub nr_kernel_stack: u64,
    pub nr_bounce: u64,
    pub nr_shmem: u64,
    pub nr_dirtied: u64,
    pub nr_written: u64,
    pub pgpgin: u64,
    pub pgpgout: u64,
    pub pswpin: u64,
    pub pswpout: u64,
    pub pgalloc_dma: u64,
    pub pgalloc_dma32: u64,
    pub pgalloc_normal: u64,
    pub pgfree: u64,
    pub pgactivate: u64,
    pub pgdeactivate: u64,
    pub pgfault: u64,
    pub pgmajfault: u64,
    pub pgsteal_kswapd: u64,
    pub pgsteal_direct: u64,
    pub pgscan_kswapd: u64,
    pub pgscan_direct: u64,
    pub oom_kill: u64,
    pub compact_stall: u64,
    pub thp_fault_alloc: u64,
    pub thp_collapse_alloc: u64,
}

/// `/proc/net/snmp` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snmp {
    pub ip: MetricTable,
    pub icmp: MetricTable,
    pub icmp_msg: MetricTable,
    pub tcp: MetricTable,
    pub udp: MetricTable,
    pub udp_lite: MetricTable,
}

/// `/proc/net/netstat` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netstat {
    pub tcp_ext: MetricTable,
    pub ip_ext: MetricTable,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mptcp_ext: MetricTable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub snmp: Snmp,
    pub netstat: Netstat,
}

/// Serializes a `Duration` as integer nanoseconds.
pub(crate) mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_nanos)
    }
}
