//! Hex bitmask expansion, used for the `Cap*` lines of `/proc/<pid>/status`.

use hp_common::ParseError;

/// Expand set bits of a hex mask into names, lowest bit first.
///
/// `name_of` must be total; use [`capability_name`] or a closure that falls
/// back to the bit index.
pub fn decode_bitmask<F>(hex: &str, name_of: F) -> Result<Vec<String>, ParseError>
where
    F: Fn(u32) -> String,
{
    let mask = u64::from_str_radix(hex.trim(), 16).map_err(|_| ParseError::InvalidBitmask {
        value: hex.to_string(),
    })?;

    Ok((0..64)
        .filter(|bit| mask & (1u64 << bit) != 0)
        .map(name_of)
        .collect())
}

/// Linux capability names indexed by bit number.
pub const CAPABILITY_NAMES: [&str; 41] = [
    "CAP_CHOWN",
    "CAP_DAC_OVERRIDE",
    "CAP_DAC_READ_SEARCH",
    "CAP_FOWNER",
    "CAP_FSETID",
    "CAP_KILL",
    "CAP_SETGID",
    "CAP_SETUID",
    "CAP_SETPCAP",
    "CAP_LINUX_IMMUTABLE",
    "CAP_NET_BIND_SERVICE",
    "CAP_NET_BROADCAST",
    "CAP_NET_ADMIN",
    "CAP_NET_RAW",
    "CAP_IPC_LOCK",
    "CAP_IPC_OWNER",
    "CAP_SYS_MODULE",
    "CAP_SYS_RAWIO",
    "CAP_SYS_CHROOT",
    "CAP_SYS_PTRACE",
    "CAP_SYS_PACCT",
    "CAP_SYS_ADMIN",
    "CAP_SYS_BOOT",
    "CAP_SYS_NICE",
    "CAP_SYS_RESOURCE",
    "CAP_SYS_TIME",
    "CAP_SYS_TTY_CONFIG",
    "CAP_MKNOD",
    "CAP_LEASE",
    "CAP_AUDIT_WRITE",
    "CAP_AUDIT_CONTROL",
    "CAP_SETFCAP",
    "CAP_MAC_OVERRIDE",
    "CAP_MAC_ADMIN",
    "CAP_SYSLOG",
    "CAP_WAKE_ALARM",
    "CAP_BLOCK_SUSPEND",
    "CAP_AUDIT_READ",
    "CAP_PERFMON",
    "CAP_BPF",
    "CAP_CHECKPOINT_RESTORE",
];

/// Name for a capability bit; unknown bits render as their number.
pub fn capability_name(bit: u32) -> String {
    CAPABILITY_NAMES
        .get(bit as usize)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| bit.to_string())
}
