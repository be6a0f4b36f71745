//! Linux distribution identity from `/etc/os-release` and the older
//! `/etc/<distrib>-release` one-liners.
//!
//! Selection order per search root:
//! 1. `etc/os-release` (falling back to `usr/lib/os-release`). The
//!    `DISTRIB_*` keys of `etc/lsb-release` fill in what os-release lacks,
//!    so `DISTRIB_CODENAME` is available to older Ubuntu releases.
//! 2. The first non-empty file of [`DISTRIB_RELEASE_FILES`] found in `etc/`.
//!
//! Red Hat family releases often omit minor/patch from os-release
//! (`VERSION="7 (Core)"`), so those are taken from the distrib file when one
//! exists.

use hp_common::{OsInfo, ParseError};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, trace};

use super::keyvalue::KeyValueParser;

const OS_RELEASE: &str = "etc/os-release";
const OS_RELEASE_FALLBACK: &str = "usr/lib/os-release";
const LSB_RELEASE: &str = "etc/lsb-release";

/// Allow-listed `etc/*-release` basenames in priority order.
pub const DISTRIB_RELEASE_FILES: &[&str] = &[
    "centos-release",
    "redhat-release",
    "rocky-release",
    "almalinux-release",
    "fedora-release",
    "oracle-release",
    "system-release",
    "gentoo-release",
    "SuSE-release",
];

/// Distribution id to family. Looked up by `ID`, then by each `ID_LIKE` entry.
const FAMILIES: &[(&str, &[&str])] = &[
    ("arch", &["arch", "antergos", "manjaro", "endeavouros"]),
    (
        "redhat",
        &[
            "redhat",
            "fedora",
            "centos",
            "scientific",
            "oraclelinux",
            "ol",
            "amzn",
            "rhel",
            "almalinux",
            "openeuler",
            "rocky",
        ],
    ),
    ("debian", &["debian", "ubuntu", "raspbian", "linuxmint", "pop"]),
    (
        "suse",
        &["suse", "sles", "opensuse", "opensuse-leap", "opensuse-tumbleweed"],
    ),
    ("alpine", &["alpine"]),
];

/// Keys consulted for the codename, most specific first.
const CODENAME_KEYS: &[&str] = &["VERSION_CODENAME", "UBUNTU_CODENAME", "DISTRIB_CODENAME"];

/// Family for a distribution id, e.g. `centos` -> `redhat`.
pub fn linux_family(id: &str) -> Option<&'static str> {
    let id = id.to_ascii_lowercase();
    FAMILIES
        .iter()
        .find(|(_, ids)| ids.contains(&id.as_str()))
        .map(|(family, _)| *family)
}

/// Numeric components of a version string.
///
/// The leading token (up to whitespace, `,` or `(`) is split on `.` and
/// then `-`; the first three components become major/minor/patch. A
/// component that is not a plain integer is 0.
pub fn version_components(version: &str) -> (u64, u64, u64) {
    let token = version
        .trim()
        .split(|c: char| c.is_whitespace() || c == ',' || c == '(')
        .next()
        .unwrap_or_default();

    let mut parts = token
        .split('.')
        .flat_map(|part| part.split('-'))
        .map(|part| part.parse::<u64>().unwrap_or(0));

    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

fn starts_with_digit(s: &str) -> bool {
    s.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

fn paren_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\s*([^)]+?)\s*\)").expect("static regex"))
}

fn distrib_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<name>.*?)\s*(?:release\s+)?(?P<version>\d[\w.\-]*)(?:\s*\((?P<codename>[^)]+)\))?",
        )
        .expect("static regex")
    })
}

/// Remove shell-style quoting from an os-release value.
///
/// Returns `None` for a value that opens a quote it does not close or that
/// contains a stray unescaped quote.
pub fn unquote(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    match chars.next() {
        Some('\'') => {
            let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
            (!inner.contains('\'')).then(|| inner.to_string())
        }
        Some('"') => {
            let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
            let mut out = String::with_capacity(inner.len());
            let mut it = inner.chars();
            while let Some(c) = it.next() {
                match c {
                    '\\' => match it.next()? {
                        esc @ ('"' | '\\' | '$' | '`') => out.push(esc),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    },
                    '"' => return None,
                    c => out.push(c),
                }
            }
            Some(out)
        }
        _ => Some(raw.to_string()),
    }
}

/// Parse os-release formatted content into its fields.
///
/// Comments (`#`) and blank lines are skipped. A value with broken quoting
/// drops that key only.
pub fn parse_os_release_fields(content: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    let mut fields = HashMap::new();
    KeyValueParser::new(b'=')
        .with_comments(b'#')
        .parse(content, |key, value| {
            let key = String::from_utf8_lossy(key).into_owned();
            let raw = String::from_utf8_lossy(value);
            match unquote(&raw) {
                Some(value) => {
                    fields.insert(key, value.trim().to_string());
                }
                None => debug!(key = %key, value = %raw, "skipping os-release key with malformed quoting"),
            }
            Ok(())
        })?;
    Ok(fields)
}

/// Build an [`OsInfo`] from os-release content.
pub fn parse_os_release(content: &[u8]) -> Result<OsInfo, ParseError> {
    let fields = parse_os_release_fields(content)?;
    Ok(os_info_from_fields(&fields))
}

fn os_info_from_fields(fields: &HashMap<String, String>) -> OsInfo {
    let get = |key: &str| fields.get(key).cloned().unwrap_or_default();

    let name = get("NAME");
    let mut platform = get("ID").to_ascii_lowercase();
    if platform.is_empty() {
        platform = name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
    }

    let version = get("VERSION");
    let version_id = get("VERSION_ID");
    let numeric_source = if starts_with_digit(&version) {
        &version
    } else {
        &version_id
    };
    let (major, minor, patch) = version_components(numeric_source);

    let mut codename = CODENAME_KEYS
        .iter()
        .find_map(|key| fields.get(*key).filter(|v| !v.is_empty()).cloned())
        .or_else(|| {
            // Any other *CODENAME key, in a stable order.
            let others: BTreeSet<&String> =
                fields.keys().filter(|k| k.contains("CODENAME")).collect();
            others
                .into_iter()
                .find_map(|k| fields.get(k).filter(|v| !v.is_empty()).cloned())
        })
        .unwrap_or_default();
    if codename.is_empty() {
        if let Some(caps) = paren_suffix_re().captures(&version) {
            codename = caps[1].to_string();
        }
    }

    let family = linux_family(&platform)
        .or_else(|| {
            fields
                .get("ID_LIKE")
                .into_iter()
                .flat_map(|like| like.split_whitespace())
                .find_map(linux_family)
        })
        .unwrap_or_default()
        .to_string();

    OsInfo {
        os_type: "linux".to_string(),
        family,
        platform,
        name,
        version,
        major,
        minor,
        patch,
        build: get("BUILD_ID"),
        codename,
    }
}

/// Build an [`OsInfo`] from the first line of an `<distrib>-release` file,
/// e.g. `CentOS Linux release 7.4.1708 (Core)`.
///
/// `platform` is the file's basename prefix (`centos` for `centos-release`).
pub fn parse_distrib_release(platform: &str, content: &[u8]) -> OsInfo {
    let text = String::from_utf8_lossy(content);
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    let platform = platform.to_ascii_lowercase();

    let mut info = OsInfo {
        os_type: "linux".to_string(),
        family: linux_family(&platform).unwrap_or_default().to_string(),
        platform,
        ..Default::default()
    };

    match distrib_re().captures(line) {
        Some(caps) => {
            info.name = caps["name"].trim().to_string();
            let version = &caps["version"];
            (info.major, info.minor, info.patch) = version_components(version);
            info.version = version.to_string();
            if let Some(codename) = caps.name("codename") {
                info.codename = codename.as_str().trim().to_string();
                info.version = format!("{} ({})", version, info.codename);
            }
        }
        None => {
            trace!(line, "distrib release line carries no version");
            info.name = line.to_string();
        }
    }
    info
}

/// Non-empty contents of `path`, or `None` when missing, unreadable, or empty.
fn read_nonempty(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) if !bytes.trim_ascii().is_empty() => Some(bytes),
        Ok(_) => {
            trace!(path = %path.display(), "release file is empty");
            None
        }
        Err(err) => {
            trace!(path = %path.display(), error = %err, "release file not readable");
            None
        }
    }
}

/// Allow-listed `*-release` files present in `<root>/etc`, in priority order.
fn distrib_candidates(root: &Path) -> Vec<PathBuf> {
    let etc = root.join("etc");
    let present: BTreeSet<String> = match fs::read_dir(&etc) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.ends_with("-release"))
            .collect(),
        Err(_) => return Vec::new(),
    };

    DISTRIB_RELEASE_FILES
        .iter()
        .filter(|name| present.contains(**name))
        .map(|name| etc.join(name))
        .collect()
}

fn find_distrib_release(root: &Path) -> Option<OsInfo> {
    distrib_candidates(root).into_iter().find_map(|path| {
        let content = read_nonempty(&path)?;
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let platform = file_name.split('-').next().unwrap_or_default();
        debug!(path = %path.display(), "using distrib release file");
        Some(parse_distrib_release(platform, &content))
    })
}

fn read_os_release(root: &Path) -> Result<Option<OsInfo>, ParseError> {
    let Some(os_release) = [OS_RELEASE, OS_RELEASE_FALLBACK]
        .iter()
        .find_map(|rel| read_nonempty(&root.join(rel)))
    else {
        return Ok(None);
    };

    let mut fields = parse_os_release_fields(&os_release)?;
    if let Some(lsb) = read_nonempty(&root.join(LSB_RELEASE)) {
        match parse_os_release_fields(&lsb) {
            Ok(lsb) => {
                for (key, value) in lsb.into_iter().filter(|(k, _)| k.starts_with("DISTRIB_")) {
                    fields.entry(key).or_insert(value);
                }
            }
            Err(err) => debug!(root = %root.display(), error = %err, "ignoring malformed lsb-release"),
        }
    }

    Ok(Some(os_info_from_fields(&fields)))
}

/// Identify the distribution installed under the first root that has any
/// recognized release file.
pub fn identify_distribution<P: AsRef<Path>>(roots: &[P]) -> Result<OsInfo, ParseError> {
    let mut searched = Vec::new();

    for root in roots {
        let root = root.as_ref();
        searched.push(root.join("etc"));

        if let Some(mut info) = read_os_release(root)? {
            if info.family == "redhat" {
                match find_distrib_release(root) {
                    Some(distrib) => {
                        info.major = distrib.major;
                        info.minor = distrib.minor;
                        info.patch = distrib.patch;
                        if !distrib.codename.is_empty() {
                            info.codename = distrib.codename;
                        }
                    }
                    None => debug!(root = %root.display(), "no distrib release file to refine version"),
                }
            }
            return Ok(info);
        }

        if let Some(info) = find_distrib_release(root) {
            return Ok(info);
        }
    }

    Err(ParseError::ReleaseFileNotFound { searched })
}
