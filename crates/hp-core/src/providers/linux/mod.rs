//! Linux backend. Everything is read from procfs and `/etc` below a
//! configurable root so that a container can inspect its host through a
//! bind mount (`--hostfs /hostfs`).

mod boot_time;
mod host;
mod process;

pub use boot_time::boot_time;
pub use host::LinuxHost;
pub use process::LinuxProcess;

use hp_common::{Error, ParseError, Result};
use std::path::Path;

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::io(path, source))
}

/// Read `path` and run a content parser over it, tagging failures with the
/// file name.
pub(crate) fn parse_file<T>(
    path: &Path,
    parse: impl FnOnce(&[u8]) -> std::result::Result<T, ParseError>,
) -> Result<T> {
    let content = read_file(path)?;
    parse(&content).map_err(|err| Error::parse_file(path, err))
}
