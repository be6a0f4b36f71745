//! Per-process records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::host::MetricTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: u32,
    pub ppid: u32,
    pub cwd: String,
    pub exe: String,
    pub args: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Executable, arguments, and environment of a process, as decoded from a
/// kernel argument buffer (`kern.procargs2` on macOS).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessArgs {
    /// Argument count the kernel wrote in the buffer header. Informational;
    /// `args.len()` is authoritative.
    pub argc: i32,
    pub exe: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMemoryInfo {
    /// Resident set size in bytes.
    pub resident: u64,
    /// Virtual memory size in bytes.
    #[serde(rename = "virtual")]
    pub virtual_size: u64,
    #[serde(default, rename = "raw", skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: MetricTable,
}

/// Real, effective and saved user/group ids of a process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: String,
    pub euid: String,
    pub suid: String,
    pub gid: String,
    pub egid: String,
    pub sgid: String,
}

/// Linux capability sets, each a list of `CAP_*` names in bit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityInfo {
    pub inheritable: Vec<String>,
    pub permitted: Vec<String>,
    pub effective: Vec<String>,
    pub bounding: Vec<String>,
    pub ambient: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeccompInfo {
    /// `disabled`, `strict`, `filter`, or the raw number for unknown modes.
    pub mode: String,
    pub no_new_privs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_info_renames_virtual() {
        let info = ProcessMemoryInfo {
            resident: 10,
            virtual_size: 20,
            metrics: MetricTable::new(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["virtual"], 20);
        assert!(json.get("raw").is_none());
    }

    #[test]
    fn process_args_env_is_sorted() {
        let mut args = ProcessArgs::default();
        args.env.insert("ZED".into(), "1".into());
        args.env.insert("ALPHA".into(), "".into());
        let json = serde_json::to_string(&args.env).unwrap();
        assert_eq!(json, r#"{"ALPHA":"","ZED":"1"}"#);
    }
}
