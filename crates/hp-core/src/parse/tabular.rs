//! Tabular counter files.
//!
//! - Single line per metric: `/proc/vmstat` (`nr_free_pages 123456`).
//! - Header/value line pairs: `/proc/net/snmp` and `/proc/net/netstat`:
//!
//! ```text
//! Tcp: RtoAlgorithm RtoMin RtoMax MaxConn
//! Tcp: 1 200 120000 -1
//! ```

use hp_common::{MetricTable, ParseError, SectionTable};

use super::keyvalue::parse_key_value;
use super::quantity::{invalid_number, parse_quantity};

/// Parse `"<name> <quantity>"` lines. Every name is kept.
pub fn parse_tabular(content: &[u8]) -> Result<MetricTable, ParseError> {
    let mut table = MetricTable::new();
    parse_key_value(content, b' ', |key, value| {
        let value = parse_quantity(value)?;
        table.insert(String::from_utf8_lossy(key).into_owned(), value);
        Ok(())
    })?;
    Ok(table)
}

/// Counter value. Negative values are stored as their two's complement so
/// that `-1` sentinels (e.g. `Tcp MaxConn`) survive as `u64::MAX`.
fn parse_counter(token: &str) -> Result<u64, ParseError> {
    token
        .parse::<u64>()
        .or_else(|_| token.parse::<i64>().map(|v| v as u64))
        .map_err(|_| invalid_number(token.as_bytes()))
}

fn split_section(line: &str, line_no: usize) -> Result<(&str, &str), ParseError> {
    line.split_once(':')
        .map(|(section, rest)| (section.trim(), rest))
        .ok_or(ParseError::MalformedLine {
            line: line_no,
            separator: ':',
        })
}

/// Parse header/value line pairs into `section -> metric -> value`.
///
/// Both lines of a pair must carry the same section prefix and the same
/// number of fields. Blank lines are ignored. A section that appears twice
/// is merged.
pub fn parse_dual_line_tabular(content: &[u8]) -> Result<SectionTable, ParseError> {
    let text = String::from_utf8_lossy(content);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let mut table = SectionTable::new();
    while let Some((header_no, header)) = lines.next() {
        let (section, keys) = split_section(header, header_no)?;

        let Some((values_no, values_line)) = lines.next() else {
            return Err(ParseError::UnalignedSection {
                line: header_no,
                expected: section.to_string(),
                found: String::new(),
            });
        };
        let (value_section, values) = split_section(values_line, values_no)?;
        if value_section != section {
            return Err(ParseError::UnalignedSection {
                line: values_no,
                expected: section.to_string(),
                found: value_section.to_string(),
            });
        }

        let keys: Vec<&str> = keys.split_whitespace().collect();
        let values: Vec<&str> = values.split_whitespace().collect();
        if keys.len() != values.len() {
            return Err(ParseError::FieldCountMismatch {
                section: section.to_string(),
                keys: keys.len(),
                values: values.len(),
            });
        }

        let metrics = table.entry(section.to_string()).or_default();
        for (key, value) in keys.into_iter().zip(values) {
            metrics.insert(key.to_string(), parse_counter(value)?);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNMP: &str = "Ip: Forwarding DefaultTTL InReceives InHdrErrors
Ip: 1 64 2354322 0
Icmp: InMsgs InErrors InCsumErrors
Icmp: 103 0 0
IcmpMsg: InType3 OutType3
IcmpMsg: 103 103
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens
Tcp: 1 200 120000 -1 52874
Udp: InDatagrams NoPorts InErrors
Udp: 124312 12 0
UdpLite: InDatagrams NoPorts
UdpLite: 0 0
";

    #[test]
    fn test_parse_tabular_vmstat() {
        let table = parse_tabular(b"nr_free_pages 2000\nnr_zone_inactive_anon 15\npgfault 912394\n")
            .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table["nr_free_pages"], 2000);
        assert_eq!(table["nr_zone_inactive_anon"], 15);
    }

    #[test]
    fn test_parse_tabular_bad_value() {
        assert!(matches!(
            parse_tabular(b"nr_free_pages abc\n"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_tabular(b"nr_free_pages\n"),
            Err(ParseError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_snmp() {
        let table = parse_dual_line_tabular(SNMP.as_bytes()).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table["Ip"]["DefaultTTL"], 64);
        assert_eq!(table["Tcp"]["MaxConn"], u64::MAX);
        assert_eq!(table["Tcp"]["ActiveOpens"], 52874);
        assert_eq!(table["UdpLite"]["NoPorts"], 0);
    }

    #[test]
    fn test_field_count_mismatch() {
        let err = parse_dual_line_tabular(b"Ip: A B C\nIp: 1 2\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCountMismatch {
                section: "Ip".into(),
                keys: 3,
                values: 2
            }
        );
    }

    #[test]
    fn test_unaligned_section() {
        let err = parse_dual_line_tabular(b"Ip: A B\nTcp: 1 2\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnalignedSection {
                line: 2,
                expected: "Ip".into(),
                found: "Tcp".into()
            }
        );
    }

    #[test]
    fn test_odd_number_of_lines() {
        let err = parse_dual_line_tabular(b"Ip: A\nIp: 1\nTcp: B\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnalignedSection { line: 3, ref expected, .. } if expected == "Tcp"
        ));
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_dual_line_tabular(b"Ip A B\nIp: 1 2\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedLine {
                line: 1,
                separator: ':'
            }
        );
    }

    #[test]
    fn test_non_numeric_value() {
        assert!(matches!(
            parse_dual_line_tabular(b"Ip: A\nIp: x\n"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_dual_line_tabular(b"").unwrap().is_empty());
        assert!(parse_tabular(b"\n").unwrap().is_empty());
    }

    #[test]
    fn test_repeated_section_merges() {
        let table = parse_dual_line_tabular(b"TcpExt: A\nTcpExt: 1\nTcpExt: B\nTcpExt: 2\n").unwrap();
        assert_eq!(table["TcpExt"].len(), 2);
    }
}
