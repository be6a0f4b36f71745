//! Fuzz target for the `key<sep>value` line parser.
//!
//! Exercises every separator used by a system file, with and without a
//! comment marker.

#![no_main]

use arbitrary::Arbitrary;
use hp_core::parse::{find_value, KeyValueParser};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Separator {
    Colon,
    Equals,
    Space,
}

#[derive(Debug, Arbitrary)]
struct Input {
    separator: Separator,
    comments: bool,
    key: String,
    content: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let sep = match input.separator {
        Separator::Colon => b':',
        Separator::Equals => b'=',
        Separator::Space => b' ',
    };
    let mut parser = KeyValueParser::new(sep);
    if input.comments {
        parser = parser.with_comments(b'#');
    }

    let _ = parser.parse(&input.content, |key, value| {
        assert!(!key.contains(&b'\n') && !value.contains(&b'\n'));
        Ok(())
    });
    let _ = parser.parse_map(&input.content);
    let _ = find_value(&input.content, sep, &input.key);
});
