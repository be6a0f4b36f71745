//! Configuration loading for hostprobe.
//!
//! The config file is JSON:
//!
//! ```json
//! { "hostfs": "/hostfs", "log": { "level": "debug", "format": "json" } }
//! ```
//!
//! File lookup order (first hit wins):
//! 1. `--config <path>`
//! 2. `HOSTPROBE_CONFIG`
//! 3. `$XDG_CONFIG_HOME/hostprobe/config.json`
//! 4. `/etc/hostprobe/config.json`
//!
//! Explicit paths (1 and 2) must exist. The host root is then taken from
//! `--hostfs`, `HOSTPROBE_HOSTFS`, the file, or `/`, in that order.

use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CONFIG_DIR_NAME: &str = "hostprobe";
const CONFIG_FILE_NAME: &str = "config.json";
const SYSTEM_CONFIG_PATH: &str = "/etc/hostprobe/config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("invalid JSON in config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("host root {} is not a directory", .path.display())]
    InvalidHostfs { path: PathBuf },
}

impl From<ConfigError> for hp_common::Error {
    fn from(err: ConfigError) -> Self {
        hp_common::Error::Config(err.to_string())
    }
}

/// Settings read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Root under which `proc/` and `etc/` are read. `None` means `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostfs: Option<PathBuf>,
    pub log: LogConfig,
}

impl ProbeConfig {
    /// Host root to read from.
    pub fn root(&self) -> &Path {
        self.hostfs.as_deref().unwrap_or(Path::new("/"))
    }
}

/// Command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub config_path: Option<PathBuf>,
    pub hostfs: Option<PathBuf>,
}

/// Loaded configuration and the file it came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: ProbeConfig,
    pub source: Option<PathBuf>,
}

/// Resolve configuration from CLI options, the environment and config files.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, |key| std::env::var_os(key).map(PathBuf::from))
}

fn load_config_with(
    options: &ConfigOptions,
    var: impl Fn(&str) -> Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let source = resolve_config_path(options, &var)?;
    let mut config = match &source {
        Some(path) => load_config_file(path)?,
        None => ProbeConfig::default(),
    };

    if let Some(hostfs) = options.hostfs.clone().or_else(|| var("HOSTPROBE_HOSTFS")) {
        config.hostfs = Some(hostfs);
    }
    if let Some(path) = &config.hostfs {
        if !path.is_dir() {
            return Err(ConfigError::InvalidHostfs { path: path.clone() });
        }
    }

    debug!(source = ?source, root = %config.root().display(), "configuration resolved");
    Ok(ResolvedConfig { config, source })
}

fn resolve_config_path(
    options: &ConfigOptions,
    var: &impl Fn(&str) -> Option<PathBuf>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = options.config_path.clone().or_else(|| var("HOSTPROBE_CONFIG")) {
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }
        return Ok(Some(path));
    }

    let xdg = var("XDG_CONFIG_HOME")
        .or_else(dirs::config_dir)
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    Ok(xdg
        .into_iter()
        .chain(std::iter::once(PathBuf::from(SYSTEM_CONFIG_PATH)))
        .find(|path| path.is_file()))
}

/// Read and parse one config file.
pub fn load_config_file(path: &Path) -> Result<ProbeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
