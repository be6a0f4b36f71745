//! `"<uint> [unit]"` fields such as `"4096 kB"`.

use hp_common::ParseError;

/// Parse a count with an optional unit. Only `kB` (1024) is recognized.
pub fn parse_quantity(field: &[u8]) -> Result<u64, ParseError> {
    let mut tokens = field
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty());

    let number = tokens.next().ok_or(ParseError::EmptyValue)?;
    let value = parse_u64(number)?;

    let multiplier = match tokens.next() {
        None => 1,
        Some(b"kB") => 1024,
        Some(unit) => {
            return Err(ParseError::UnsupportedUnit(
                String::from_utf8_lossy(unit).into_owned(),
            ))
        }
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid_number(field))
}

/// Strict base-10 `u64`: no sign, no whitespace.
pub fn parse_u64(token: &[u8]) -> Result<u64, ParseError> {
    std::str::from_utf8(token)
        .ok()
        .filter(|s| !s.starts_with('+'))
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| invalid_number(token))
}

pub(crate) fn invalid_number(token: &[u8]) -> ParseError {
    ParseError::InvalidNumber {
        value: String::from_utf8_lossy(token).into_owned(),
    }
}
