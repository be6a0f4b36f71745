use chrono::{DateTime, Utc};
use hp_common::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

use super::parse_file;
use crate::parse::parse_boot_time;

/// Successful reads, keyed by the procfs they came from.
static BOOT_TIME: Mutex<BTreeMap<PathBuf, DateTime<Utc>>> = Mutex::new(BTreeMap::new());

/// Boot time from `<procfs>/stat`.
///
/// The first successful read is remembered for the life of the process.
/// The lock is held across the read: concurrent first callers see a single
/// read. Failures are not cached; a later call retries.
pub fn boot_time(procfs: &Path) -> Result<DateTime<Utc>> {
    let mut cache = BOOT_TIME.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(time) = cache.get(procfs) {
        return Ok(*time);
    }

    let time = parse_file(&procfs.join("stat"), parse_boot_time)?;
    trace!(procfs = %procfs.display(), boot_time = %time, "boot time read");
    cache.insert(procfs.to_path_buf(), time);
    Ok(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_boot_time_is_cached() {
        let dir = TempDir::new().unwrap();
        let stat = dir.path().join("stat");
        std::fs::write(&stat, "cpu 1 2 3 4\nbtime 1600000000\n").unwrap();

        let first = boot_time(dir.path()).unwrap();
        assert_eq!(first.timestamp(), 1_600_000_000);

        std::fs::write(&stat, "cpu 1 2 3 4\nbtime 1700000000\n").unwrap();
        assert_eq!(boot_time(dir.path()).unwrap(), first);
    }

    #[test]
    fn test_concurrent_first_callers_agree() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("stat"), "btime 1620000000\n").unwrap();

        let times: Vec<DateTime<Utc>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| boot_time(dir.path()).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(times.iter().all(|t| t.timestamp() == 1_620_000_000));

        // Only the cached value is served once any caller has read it.
        std::fs::write(dir.path().join("stat"), "btime 1720000000\n").unwrap();
        assert_eq!(boot_time(dir.path()).unwrap(), times[0]);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let dir = TempDir::new().unwrap();
        assert!(boot_time(dir.path()).is_err());

        std::fs::write(dir.path().join("stat"), "btime 1650000000\n").unwrap();
        assert_eq!(boot_time(dir.path()).unwrap().timestamp(), 1_650_000_000);
    }
}
