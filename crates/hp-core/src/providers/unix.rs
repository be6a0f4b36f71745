//! libc helpers shared by the unix backends.

use hp_common::{Error, Result};
use std::ffi::CStr;
use std::sync::OnceLock;

/// Kernel identification from `uname(2)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uname {
    pub nodename: String,
    pub release: String,
    pub machine: String,
}

fn field(raw: &[libc::c_char]) -> String {
    // SAFETY: uname fills every field with a NUL-terminated string.
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

impl Uname {
    pub fn read() -> Result<Self> {
        let mut raw = std::mem::MaybeUninit::<libc::utsname>::uninit();
        // SAFETY: raw is a valid out-pointer for one utsname.
        if unsafe { libc::uname(raw.as_mut_ptr()) } != 0 {
            return Err(Error::Syscall {
                call: "uname",
                source: std::io::Error::last_os_error(),
            });
        }
        // SAFETY: uname returned 0, so the struct is initialized.
        let raw = unsafe { raw.assume_init() };
        Ok(Uname {
            nodename: field(&raw.nodename),
            release: field(&raw.release),
            machine: field(&raw.machine),
        })
    }
}

/// Clock ticks per second, typically 100.
pub fn clk_tck() -> u64 {
    static CLK_TCK: OnceLock<u64> = OnceLock::new();
    *CLK_TCK.get_or_init(|| {
        // SAFETY: sysconf has no preconditions.
        let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(tck).ok().filter(|&t| t > 0).unwrap_or(100)
    })
}

pub fn page_size() -> u64 {
    static PAGE_SIZE: OnceLock<u64> = OnceLock::new();
    *PAGE_SIZE.get_or_init(|| {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        u64::try_from(size).ok().filter(|&s| s > 0).unwrap_or(4096)
    })
}

/// Timezone name and offset of the local clock.
///
/// The name comes from `TZ`, then the `/etc/localtime` link target, then the
/// offset itself.
pub fn local_timezone(localtime: &std::path::Path) -> (String, i32) {
    let offset = chrono::Local::now().offset().local_minus_utc();
    let name = std::env::var("TZ")
        .ok()
        .map(|tz| tz.trim_start_matches(':').to_string())
        .filter(|tz| !tz.is_empty())
        .or_else(|| {
            std::fs::read_link(localtime)
                .ok()
                .and_then(|target| zone_from_link(&target))
        })
        .unwrap_or_else(|| offset_name(offset));
    (name, offset)
}

/// `Europe/Berlin` from `/usr/share/zoneinfo/Europe/Berlin`.
pub fn zone_from_link(target: &std::path::Path) -> Option<String> {
    let target = target.to_string_lossy();
    let (_, zone) = target.split_once("zoneinfo/")?;
    (!zone.is_empty()).then(|| zone.to_string())
}

fn offset_name(offset: i32) -> String {
    if offset == 0 {
        return "UTC".to_string();
    }
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}
