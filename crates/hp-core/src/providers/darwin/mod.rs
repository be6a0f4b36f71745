//! macOS backend using `sysctl(3)` and libproc.
//!
//! # Sources
//! - `sysctl(CTL_KERN, KERN_PROCARGS2, pid)` - executable, argv, environment
//! - `proc_pidinfo(PROC_PIDTBSDINFO)` - name, parent, ids, start time
//! - `proc_pidinfo(PROC_PIDTASKINFO)` - memory and CPU time
//! - `kern.boottime`, `hw.memsize`, `vm.swapusage` and friends for the host

mod host;
mod process;

pub use host::DarwinHost;
pub use process::DarwinProcess;

use hp_common::{Error, Result};
use libc::{c_int, c_void};
use std::ffi::CString;

fn last_os_error(call: &'static str) -> Error {
    Error::Syscall {
        call,
        source: std::io::Error::last_os_error(),
    }
}

/// Two-call sysctl: ask for the size, then fill a buffer of that size.
pub(crate) fn sysctl_mib(mib: &mut [c_int], call: &'static str) -> Result<Vec<u8>> {
    let namelen = libc::c_uint::try_from(mib.len()).map_err(|_| Error::NotImplemented(call))?;
    let mut size: libc::size_t = 0;
    // SAFETY: a null old pointer asks the kernel for the required size only.
    let ret = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            namelen,
            std::ptr::null_mut(),
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(last_os_error(call));
    }

    let mut buf = vec![0u8; size];
    // SAFETY: buf holds `size` writable bytes and the kernel writes at most that.
    let ret = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            namelen,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(last_os_error(call));
    }
    buf.truncate(size);
    Ok(buf)
}

pub(crate) fn sysctl_by_name(name: &'static str) -> Result<Vec<u8>> {
    let cname = CString::new(name).map_err(|_| Error::NotImplemented(name))?;
    let mut size: libc::size_t = 0;
    // SAFETY: size query, as in sysctl_mib.
    let ret = unsafe {
        libc::sysctlbyname(
            cname.as_ptr(),
            std::ptr::null_mut(),
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(last_os_error(name));
    }

    let mut buf = vec![0u8; size];
    // SAFETY: buf holds `size` writable bytes.
    let ret = unsafe {
        libc::sysctlbyname(
            cname.as_ptr(),
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(last_os_error(name));
    }
    buf.truncate(size);
    Ok(buf)
}

/// String sysctl, without the trailing NUL.
pub(crate) fn sysctl_string(name: &'static str) -> Result<String> {
    let buf = sysctl_by_name(name)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Integer sysctl of 4 or 8 bytes.
pub(crate) fn sysctl_u64(name: &'static str) -> Result<u64> {
    let buf = sysctl_by_name(name)?;
    if let Some(bytes) = buf.first_chunk::<8>() {
        Ok(u64::from_ne_bytes(*bytes))
    } else if let Some(bytes) = buf.first_chunk::<4>() {
        Ok(u64::from(u32::from_ne_bytes(*bytes)))
    } else {
        Err(Error::Parse(hp_common::ParseError::TruncatedHeader { len: buf.len() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysctl_string() {
        let version = sysctl_string("kern.osproductversion").unwrap();
        assert!(version.chars().next().is_some_and(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_sysctl_u64() {
        assert!(sysctl_u64("hw.memsize").unwrap() > 0);
    }

    #[test]
    fn test_unknown_sysctl_fails() {
        assert!(matches!(
            sysctl_by_name("hostprobe.no.such.node"),
            Err(Error::Syscall { .. })
        ));
    }
}
