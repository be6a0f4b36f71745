//! Exit codes for the hostprobe CLI.
//!
//! - 0: success
//! - 1: partial result (some host fields could not be read)
//! - 10-19: user/environment errors
//! - 20-29: internal errors

use hp_common::{Error, ErrorCategory};

/// Stable exit codes. Changes require a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,

    /// Output was printed but some fields failed to collect.
    Partial = 1,

    /// Invalid arguments or configuration
    ArgsError = 10,

    /// Requested process does not exist
    NotFound = 11,

    PermissionError = 12,

    /// Not supported on this platform
    Unsupported = 13,

    /// Internal error (bug - please report)
    InternalError = 20,

    IoError = 21,

    /// A host file had unexpected content
    ParseError = 22,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Partial)
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Name used in JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::Partial => "OK_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::Unsupported => "ERR_UNSUPPORTED",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::ParseError => "ERR_PARSE",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::ProcessNotFound { .. } => ExitCode::NotFound,
            Error::PermissionDenied { .. } => ExitCode::PermissionError,
            Error::Io { source, .. } | Error::Syscall { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ExitCode::PermissionError
            }
            Error::Json(_) => ExitCode::InternalError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ArgsError,
                ErrorCategory::Parse => ExitCode::ParseError,
                ErrorCategory::Io => ExitCode::IoError,
                ErrorCategory::Platform => ExitCode::Unsupported,
                ErrorCategory::Collection => ExitCode::Partial,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_common::{MultiError, ParseError};

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::Partial.is_success());
        assert!(ExitCode::NotFound.is_user_error());
        assert!(!ExitCode::NotFound.is_internal_error());
        assert!(ExitCode::ParseError.is_internal_error());
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from(&Error::ProcessNotFound { pid: 9 }),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from(&Error::UnsupportedPlatform("plan9".into())),
            ExitCode::Unsupported
        );
        assert_eq!(
            ExitCode::from(&Error::Parse(ParseError::EmptyValue)),
            ExitCode::ParseError
        );
        assert_eq!(
            ExitCode::from(&Error::Config("bad".into())),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::from(&Error::Multiple(MultiError::new())),
            ExitCode::Partial
        );
    }

    #[test]
    fn test_permission_io_maps_to_permission() {
        let err = Error::io(
            "/proc/1/environ",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(ExitCode::from(&err), ExitCode::PermissionError);

        let err = Error::io("/proc/stat", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(ExitCode::from(&err), ExitCode::IoError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::NotFound.to_string(), "ERR_NOT_FOUND (11)");
    }
}
