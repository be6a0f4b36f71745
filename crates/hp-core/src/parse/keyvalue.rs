//! Line-oriented `key<sep>value` parsing.
//!
//! Used for `/proc/meminfo` (`:`), `/proc/<pid>/status` (`:`),
//! `/proc/vmstat` (` `) and `/etc/os-release` (`=`).
//!
//! Policy: every line that is non-empty after trimming must contain the
//! separator, otherwise the whole parse fails with
//! [`ParseError::MalformedLine`]. Comment lines are only recognized when a
//! marker is configured with [`KeyValueParser::with_comments`].

use hp_common::ParseError;
use std::collections::HashMap;

/// Splits content into lines and each line at the first separator.
#[derive(Debug, Clone, Copy)]
pub struct KeyValueParser {
    separator: u8,
    comment: Option<u8>,
}

impl KeyValueParser {
    pub const fn new(separator: u8) -> Self {
        Self {
            separator,
            comment: None,
        }
    }

    /// Skip lines whose first non-blank byte is `marker`.
    pub const fn with_comments(mut self, marker: u8) -> Self {
        self.comment = Some(marker);
        self
    }

    /// Invoke `on_pair` for each pair in input order. Key and value are
    /// whitespace-trimmed. The final line does not need a trailing newline.
    pub fn parse<'a, F>(&self, content: &'a [u8], mut on_pair: F) -> Result<(), ParseError>
    where
        F: FnMut(&'a [u8], &'a [u8]) -> Result<(), ParseError>,
    {
        for (idx, raw) in content.split(|&b| b == b'\n').enumerate() {
            let line = raw.trim_ascii();
            if line.is_empty() {
                continue;
            }
            if self.comment.is_some_and(|marker| line[0] == marker) {
                continue;
            }

            let Some(pos) = line.iter().position(|&b| b == self.separator) else {
                return Err(ParseError::MalformedLine {
                    line: idx + 1,
                    separator: self.separator as char,
                });
            };

            on_pair(line[..pos].trim_ascii(), line[pos + 1..].trim_ascii())?;
        }
        Ok(())
    }

    /// Collect every pair into a map. Later duplicates overwrite earlier ones.
    /// Non-UTF-8 bytes are replaced.
    pub fn parse_map(&self, content: &[u8]) -> Result<HashMap<String, String>, ParseError> {
        let mut map = HashMap::new();
        self.parse(content, |key, value| {
            map.insert(
                String::from_utf8_lossy(key).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            );
            Ok(())
        })?;
        Ok(map)
    }
}

/// Shorthand for `KeyValueParser::new(separator).parse(content, on_pair)`.
pub fn parse_key_value<'a, F>(content: &'a [u8], separator: u8, on_pair: F) -> Result<(), ParseError>
where
    F: FnMut(&'a [u8], &'a [u8]) -> Result<(), ParseError>,
{
    KeyValueParser::new(separator).parse(content, on_pair)
}

/// Trimmed value of the first line whose key equals `key`.
///
/// Lines that lack the separator are ignored here; this is a lookup, not a
/// validation pass.
pub fn find_value<'a>(content: &'a [u8], separator: u8, key: &str) -> Option<&'a [u8]> {
    content.split(|&b| b == b'\n').find_map(|raw| {
        let line = raw.trim_ascii();
        let pos = line.iter().position(|&b| b == separator)?;
        (line[..pos].trim_ascii() == key.as_bytes()).then(|| line[pos + 1..].trim_ascii())
    })
}
