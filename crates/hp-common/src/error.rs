//! Error types for hostprobe.
//!
//! Two layers:
//! - [`ParseError`]: what the pure parsers return. Every malformed input maps
//!   to one of these variants; none of the parsers panic.
//! - [`Error`]: what the platform providers return. Wraps parse failures,
//!   I/O on a concrete path, and platform gaps, with stable codes for
//!   machine consumers.
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "parse",
//!   "message": "line 3: separator ':' not found",
//!   "recoverable": true,
//!   "context": { "path": "/proc/self/status" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hostprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures produced by the system-file and buffer parsers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: separator {separator:?} not found")]
    MalformedLine { line: usize, separator: char },

    #[error("invalid number {value:?}")]
    InvalidNumber { value: String },

    #[error("unhandled unit {0:?}")]
    UnsupportedUnit(String),

    #[error("empty value")]
    EmptyValue,

    #[error("invalid hex bitmask {value:?}")]
    InvalidBitmask { value: String },

    #[error("no release file found (searched {searched:?})")]
    ReleaseFileNotFound { searched: Vec<PathBuf> },

    #[error("line {line}: section {found:?} does not match header section {expected:?}")]
    UnalignedSection {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("section {section:?}: {keys} keys but {values} values")]
    FieldCountMismatch {
        section: String,
        keys: usize,
        values: usize,
    },

    #[error("procargs buffer too short for header ({len} bytes)")]
    TruncatedHeader { len: usize },

    #[error("invalid procargs data: {0}")]
    InvalidProcargsData(&'static str),
}

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed system file or kernel buffer.
    Parse,
    /// File and syscall I/O.
    Io,
    /// Process lookups that raced or lacked permission.
    Collection,
    /// Configuration file errors.
    Config,
    /// Metric or platform not available.
    Platform,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Platform => write!(f, "platform"),
        }
    }
}

/// Unified error type for hostprobe.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Parse errors (20-29)
    #[error("{}: {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    // Collection errors (30-39)
    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },

    #[error("permission denied accessing process {pid}")]
    PermissionDenied { pid: u32 },

    #[error("{0}")]
    Multiple(MultiError),

    // I/O errors (60-69)
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{call} failed: {source}")]
    Syscall {
        call: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Platform errors (70-79)
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl Error {
    /// Attach the file a parse failure came from.
    pub fn parse_file(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Error::ParseFile {
            path: path.into(),
            source,
        }
    }

    /// Wrap an I/O failure on `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Parse errors
    /// - 30-39: Collection errors
    /// - 60-69: I/O errors
    /// - 70-79: Platform errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::ParseFile { .. } => 20,
            Error::Parse(_) => 21,
            Error::ProcessNotFound { .. } => 30,
            Error::PermissionDenied { .. } => 31,
            Error::Multiple(_) => 32,
            Error::Io { .. } => 60,
            Error::Syscall { .. } => 61,
            Error::Json(_) => 62,
            Error::UnsupportedPlatform(_) => 70,
            Error::NotImplemented(_) => 71,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::ParseFile { .. } | Error::Parse(_) => ErrorCategory::Parse,
            Error::ProcessNotFound { .. } | Error::PermissionDenied { .. } | Error::Multiple(_) => {
                ErrorCategory::Collection
            }
            Error::Io { .. } | Error::Syscall { .. } | Error::Json(_) => ErrorCategory::Io,
            Error::UnsupportedPlatform(_) | Error::NotImplemented(_) => ErrorCategory::Platform,
        }
    }

    /// Returns whether retrying (or reading the remaining fields) can still
    /// produce useful output.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::ParseFile { .. } | Error::Parse(_) => true,
            Error::ProcessNotFound { .. } => false, // Process is gone
            Error::PermissionDenied { .. } => true, // Can elevate
            Error::Multiple(_) => true,
            Error::Io { .. } | Error::Syscall { .. } => true,
            Error::Json(_) => true,
            Error::UnsupportedPlatform(_) => false,
            Error::NotImplemented(_) => false,
        }
    }

    /// True for the "metric does not exist on this platform" case, which
    /// host assembly treats as absence rather than failure.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented(_))
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check the hostprobe config file syntax or remove it to use defaults.",
            Error::ParseFile { .. } | Error::Parse(_) => {
                "The system file has an unexpected format. Report it with the file contents attached."
            }
            Error::ProcessNotFound { .. } => "The process exited before it could be inspected.",
            Error::PermissionDenied { .. } => {
                "Run with elevated privileges to inspect processes owned by other users."
            }
            Error::Multiple(_) => "Some host fields could not be read; the rest were collected.",
            Error::Io { .. } => {
                "Check that the path exists and is readable. When running in a container, set --hostfs."
            }
            Error::Syscall { .. } => "The kernel rejected the request. Check privileges and sandboxing.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or restore from backup.",
            Error::UnsupportedPlatform(_) => {
                "This platform is not supported. Linux and macOS are the supported targets."
            }
            Error::NotImplemented(_) => "This metric is not available on the current platform.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::ParseFile { .. } | Error::Parse(_) => "Parse Error",
            Error::ProcessNotFound { .. } => "Process Not Found",
            Error::PermissionDenied { .. } => "Permission Denied",
            Error::Multiple(_) => "Partial Collection",
            Error::Io { .. } => "I/O Error",
            Error::Syscall { .. } => "System Call Failed",
            Error::Json(_) => "JSON Error",
            Error::UnsupportedPlatform(_) => "Unsupported Platform",
            Error::NotImplemented(_) => "Not Implemented",
        }
    }
}

/// A set of independent failures gathered while reading many fields.
///
/// Host assembly keeps reading after a field fails and reports every failure
/// at the end instead of the first one.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. `NotImplemented` is dropped: a metric the platform
    /// does not have is absent, not broken.
    pub fn push(&mut self, err: Error) {
        if err.is_not_implemented() {
            return;
        }
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise `Error::Multiple`.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Multiple(self))
        }
    }
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error(s) occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n\t* {err}")?;
        }
        Ok(())
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., pid, file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::ProcessNotFound { pid } | Error::PermissionDenied { pid } => {
                context.insert("pid".to_string(), serde_json::json!(pid));
            }
            Error::ParseFile { path, .. } | Error::Io { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::Syscall { call, .. } => {
                context.insert("call".to_string(), serde_json::json!(call));
            }
            Error::Multiple(multi) => {
                let nested: Vec<String> = multi.errors().iter().map(|e| e.to_string()).collect();
                context.insert("errors".to_string(), serde_json::json!(nested));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(Error::ProcessNotFound { pid: 123 }.code(), 30);
        assert_eq!(Error::NotImplemented("fqdn").code(), 71);
        assert_eq!(Error::from(ParseError::EmptyValue).code(), 21);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::parse_file("/proc/vmstat", ParseError::EmptyValue).category(),
            ErrorCategory::Parse
        );
        assert_eq!(
            Error::UnsupportedPlatform("plan9".into()).category(),
            ErrorCategory::Platform
        );
        assert_eq!(
            Error::PermissionDenied { pid: 1 }.category(),
            ErrorCategory::Collection
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::PermissionDenied { pid: 1 }.is_recoverable());
        assert!(!Error::ProcessNotFound { pid: 1 }.is_recoverable());
        assert!(!Error::UnsupportedPlatform("x".into()).is_recoverable());
    }

    #[test]
    fn test_parse_error_messages() {
        let err = ParseError::MalformedLine {
            line: 3,
            separator: ':',
        };
        assert_eq!(err.to_string(), "line 3: separator ':' not found");
        assert_eq!(
            ParseError::UnsupportedUnit("MB".into()).to_string(),
            "unhandled unit \"MB\""
        );
    }

    #[test]
    fn test_multi_error_skips_not_implemented() {
        let mut multi = MultiError::new();
        multi.push(Error::NotImplemented("load_average"));
        assert!(multi.is_empty());
        assert!(multi.into_result().is_ok());
    }

    #[test]
    fn test_multi_error_collects() {
        let mut multi = MultiError::new();
        multi.push(Error::Config("a".into()));
        multi.push(Error::from(ParseError::EmptyValue));
        assert_eq!(multi.len(), 2);

        let err = multi.into_result().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("2 error(s) occurred:"));
        assert!(msg.contains("empty value"));
    }

    #[test]
    fn test_structured_error_context() {
        let err = Error::io(
            "/proc/1/cgroup",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 60);
        assert_eq!(structured.context["path"], "/proc/1/cgroup");
        assert!(structured.to_json().contains("\"category\":\"io\""));
    }

    #[test]
    fn test_format_error_human_plain() {
        let out = format_error_human(&Error::ProcessNotFound { pid: 9 }, false);
        assert!(out.starts_with("✗ Process Not Found"));
        assert!(out.contains("Reason: process 9 not found"));
        assert!(out.contains("Fix: "));
    }
}
