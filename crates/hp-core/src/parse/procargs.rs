//! Decoder for the `kern.procargs2` argument buffer.
//!
//! Layout:
//!
//! ```text
//! [i32 argc, little endian]
//! [exe path] NUL [NUL padding to an 8-byte boundary of the buffer]
//! argc x ([arg] NUL)
//! ([KEY=VALUE] NUL)...
//! [trailer: an empty string, then kernel-internal strings]
//! ```
//!
//! The buffer comes from the kernel but describes another process, so every
//! read is bounds-checked and `argc` only tells us where argv ends; it never
//! sizes an allocation or drives a loop past the end of the buffer.

use hp_common::{ParseError, ProcessArgs};
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound on argv capacity reserved up front from the header count.
const MAX_PREALLOC_ARGS: usize = 256;

const HEADER_LEN: usize = 4;

/// The executable path is NUL-padded so argv starts on this boundary,
/// counted from the start of the buffer.
const ARGV_ALIGN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    ReadingExe,
    ReadingArgv { remaining: usize },
    ReadingEnv,
    Done,
}

/// Walks NUL-terminated strings without ever reading past the end.
struct CStrCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CStrCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Next terminated string. `None` at end of buffer or when the rest of
    /// the buffer has no terminator.
    fn next_cstr(&mut self) -> Option<&'a [u8]> {
        let rest = self.buf.get(self.pos..)?;
        let len = rest.iter().position(|&b| b == 0)?;
        self.pos += len + 1;
        Some(&rest[..len])
    }

    /// Skip NUL padding until `offset + pos` is a multiple of `align`.
    /// NULs past the boundary are left for the caller as empty strings.
    fn skip_padding(&mut self, offset: usize, align: usize) {
        while (offset + self.pos) % align != 0 && self.buf.get(self.pos) == Some(&0) {
            self.pos += 1;
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode a procargs buffer into executable, arguments and environment.
///
/// Fails only when there is no header or no terminated executable path.
/// Padding after the path is skipped only up to the alignment boundary, so
/// an empty first argument survives. Everything after that is best effort: a short buffer yields the entries
/// that are present, an env string without `=` ends the environment, and
/// the first occurrence of a duplicated env key wins.
pub fn decode_procargs(buf: &[u8]) -> Result<ProcessArgs, ParseError> {
    let Some((header, body)) = buf.split_first_chunk::<HEADER_LEN>() else {
        return Err(ParseError::TruncatedHeader { len: buf.len() });
    };
    let argc = i32::from_le_bytes(*header);

    let mut cursor = CStrCursor::new(body);
    let mut out = ProcessArgs {
        argc,
        ..Default::default()
    };
    let mut env = BTreeMap::new();

    let mut state = DecodeState::ReadingExe;
    loop {
        state = match state {
            DecodeState::ReadingExe => {
                if body.is_empty() {
                    return Err(ParseError::InvalidProcargsData("missing executable path"));
                }
                let exe = cursor
                    .next_cstr()
                    .ok_or(ParseError::InvalidProcargsData("unterminated executable path"))?;
                out.exe = lossy(exe);

                let remaining = usize::try_from(argc).unwrap_or(0);
                if remaining > 0 {
                    cursor.skip_padding(HEADER_LEN, ARGV_ALIGN);
                    out.args.reserve(remaining.min(MAX_PREALLOC_ARGS));
                    DecodeState::ReadingArgv { remaining }
                } else {
                    DecodeState::ReadingEnv
                }
            }
            DecodeState::ReadingArgv { remaining: 0 } => DecodeState::ReadingEnv,
            DecodeState::ReadingArgv { remaining } => match cursor.next_cstr() {
                Some(arg) => {
                    out.args.push(lossy(arg));
                    DecodeState::ReadingArgv {
                        remaining: remaining - 1,
                    }
                }
                None => DecodeState::Done,
            },
            DecodeState::ReadingEnv => match cursor.next_cstr() {
                Some(entry) => match entry.iter().position(|&b| b == b'=') {
                    Some(eq) => {
                        env.entry(lossy(&entry[..eq]))
                            .or_insert_with(|| lossy(&entry[eq + 1..]));
                        DecodeState::ReadingEnv
                    }
                    None => DecodeState::Done,
                },
                None => DecodeState::Done,
            },
            DecodeState::Done => break,
        };
    }

    if usize::try_from(argc).ok() != Some(out.args.len()) {
        debug!(
            argc,
            decoded = out.args.len(),
            "procargs header count differs from decoded arguments"
        );
    }

    out.env = env;
    Ok(out)
}

/// Build a buffer in the layout [`decode_procargs`] reads.
///
/// When `args` is non-empty the executable path is NUL-padded to an 8-byte
/// boundary as the kernel does. A trailer with kernel-style strings is
/// appended after the environment.
pub fn encode_procargs<A, K, V>(exe: &str, args: &[A], env: &[(K, V)]) -> Vec<u8>
where
    A: AsRef<str>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let argc = i32::try_from(args.len()).unwrap_or(i32::MAX);
    let mut buf = Vec::with_capacity(64 + exe.len());
    buf.extend_from_slice(&argc.to_le_bytes());

    buf.extend_from_slice(exe.as_bytes());
    buf.push(0);
    if !args.is_empty() {
        while buf.len() % 8 != 0 {
            buf.push(0);
        }
    }

    for arg in args {
        buf.extend_from_slice(arg.as_ref().as_bytes());
        buf.push(0);
    }
    for (key, value) in env {
        buf.extend_from_slice(key.as_ref().as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(value.as_ref().as_bytes());
        buf.push(0);
    }

    buf.push(0);
    buf.extend_from_slice(b"executable_path=");
    buf.extend_from_slice(exe.as_bytes());
    buf.push(0);
    buf.extend_from_slice(b"ptr_munge=\0\0\0");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn header(argc: i32) -> Vec<u8> {
        argc.to_le_bytes().to_vec()
    }

    #[test]
    fn test_typical_buffer() {
        let buf = encode_procargs(
            "/bin/ls",
            &["ls", "-la", "/tmp"],
            &[("HOME", "/Users/me"), ("EMPTY", ""), ("EQ", "a=b")],
        );
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.argc, 3);
        assert_eq!(args.exe, "/bin/ls");
        assert_eq!(args.args, vec!["ls", "-la", "/tmp"]);
        assert_eq!(args.env.len(), 3);
        assert_eq!(args.env["HOME"], "/Users/me");
        assert_eq!(args.env["EMPTY"], "");
        assert_eq!(args.env["EQ"], "a=b");
        assert!(!args.env.contains_key("executable_path"));
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(
            decode_procargs(&[]).unwrap_err(),
            ParseError::TruncatedHeader { len: 0 }
        );
        assert_eq!(
            decode_procargs(&[1, 0, 0]).unwrap_err(),
            ParseError::TruncatedHeader { len: 3 }
        );
    }

    #[test]
    fn test_header_only() {
        assert!(matches!(
            decode_procargs(&header(1)),
            Err(ParseError::InvalidProcargsData(_))
        ));
    }

    #[test]
    fn test_unterminated_exe() {
        let mut buf = header(1);
        buf.extend_from_slice(b"/bin/ls");
        assert!(matches!(
            decode_procargs(&buf),
            Err(ParseError::InvalidProcargsData(_))
        ));
    }

    #[test]
    fn test_argc_larger_than_available() {
        let mut buf = header(100);
        buf.extend_from_slice(b"/bin/sh\0sh\0-c\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.argc, 100);
        assert_eq!(args.args, vec!["sh", "-c"]);
        assert!(args.env.is_empty());
    }

    #[test]
    fn test_huge_argc_does_not_allocate() {
        let mut buf = header(i32::MAX);
        buf.extend_from_slice(b"/x\0a\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.args, vec!["a"]);
        assert!(args.args.capacity() < 4 * MAX_PREALLOC_ARGS);
    }

    #[test]
    fn test_negative_argc_reads_env_directly() {
        let mut buf = header(-5);
        buf.extend_from_slice(b"/x\0A=1\0B=2\0");
        let args = decode_procargs(&buf).unwrap();
        assert!(args.args.is_empty());
        assert_eq!(args.env.len(), 2);
    }

    #[test]
    fn test_padding_after_exe_is_skipped() {
        let mut buf = header(2);
        buf.extend_from_slice(b"/bin/a\0\0\0\0\0a\0b\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.args, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_first_argument_is_not_padding() {
        let env = [("HOME", "/h"), ("K", "V")];

        let args = decode_procargs(&encode_procargs("/bin/x", &["", "a"], &env)).unwrap();
        assert_eq!(args.args, vec!["", "a"]);
        assert_eq!(args.env.len(), 2);
        assert_eq!(args.env["HOME"], "/h");
        assert_eq!(args.env["K"], "V");

        // Header plus "abc\0" is already aligned, so there is no padding.
        let args = decode_procargs(&encode_procargs("abc", &["", "a"], &env)).unwrap();
        assert_eq!(args.args, vec!["", "a"]);
        assert_eq!(args.env["K"], "V");
    }

    #[test]
    fn test_nuls_past_alignment_are_empty_arguments() {
        let mut buf = header(3);
        buf.extend_from_slice(b"/bin/a\0\0\0\0\0\0\0\0b\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.args, vec!["", "", "b"]);
    }

    #[test]
    fn test_empty_argv_entries_are_kept() {
        let mut buf = header(3);
        buf.extend_from_slice(b"/bin/a\0a\0\0c\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.args, vec!["a", "", "c"]);
    }

    #[test]
    fn test_env_stops_at_entry_without_equals() {
        let mut buf = header(1);
        buf.extend_from_slice(b"/x\0x\0A=1\0NOEQUALS\0B=2\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.env.len(), 1);
        assert_eq!(args.env["A"], "1");
    }

    #[test]
    fn test_first_env_occurrence_wins() {
        let mut buf = header(0);
        buf.extend_from_slice(b"/x\0K=first\0K=second\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.env["K"], "first");
    }

    #[test]
    fn test_unterminated_tail_is_ignored() {
        let mut buf = header(1);
        buf.extend_from_slice(b"/x\0arg\0A=1\0B=tru");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.env.len(), 1);
        assert!(!args.env.contains_key("B"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buf = header(1);
        buf.extend_from_slice(b"/x\xff\0a\0");
        let args = decode_procargs(&buf).unwrap();
        assert_eq!(args.exe, "/x\u{fffd}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_decode_never_panics(buf in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = decode_procargs(&buf);
        }

        #[test]
        fn prop_round_trip(
            exe in "/[a-zA-Z0-9/._-]{0,40}",
            args in proptest::collection::vec("[^\\x00]{0,16}", 0..8),
            env in proptest::collection::btree_map("[A-Za-z_][A-Za-z0-9_]{0,12}", "[^\\x00]{0,16}", 0..8),
        ) {
            let pairs: Vec<(String, String)> = env.clone().into_iter().collect();
            let buf = encode_procargs(&exe, &args, &pairs);
            let decoded = decode_procargs(&buf).unwrap();
            prop_assert_eq!(decoded.exe, exe);
            prop_assert_eq!(decoded.args, args);
            prop_assert_eq!(decoded.env, env);
        }
    }
}
