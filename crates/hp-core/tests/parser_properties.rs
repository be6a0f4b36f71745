//! Property-based tests for the system-file and buffer parsers:
//! totality on arbitrary input and agreement with generated well-formed input.

use hp_core::parse::{
    decode_bitmask, decode_procargs, encode_procargs, parse_dual_line_tabular, parse_key_value,
    parse_os_release, parse_quantity, parse_tabular, version_components,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // ── procargs ────────────────────────────────────────────────────

    /// Arbitrary bytes never panic the decoder.
    #[test]
    fn procargs_total_on_arbitrary_bytes(buf in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_procargs(&buf);
    }

    /// A header claiming more arguments than present never over-reads.
    #[test]
    fn procargs_huge_argc_is_bounded(
        argc in any::<i32>(),
        body in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut buf = argc.to_le_bytes().to_vec();
        buf.extend_from_slice(&body);
        if let Ok(decoded) = decode_procargs(&buf) {
            prop_assert!(decoded.args.len() <= body.len());
            prop_assert_eq!(decoded.argc, argc);
        }
    }

    /// Well-formed buffers decode to what was encoded.
    #[test]
    fn procargs_decodes_encoded(
        exe in "/[a-z0-9/._-]{1,40}",
        args in prop::collection::vec("[a-zA-Z0-9 =/._-]{0,20}", 0..8),
        env in prop::collection::btree_map("[A-Z_][A-Z0-9_]{0,10}", "[a-zA-Z0-9=:/._ -]{0,20}", 0..8),
    ) {
        let pairs: Vec<(&String, &String)> = env.iter().collect();
        let decoded = decode_procargs(&encode_procargs(&exe, &args, &pairs)).unwrap();
        prop_assert_eq!(&decoded.exe, &exe);
        prop_assert_eq!(&decoded.args, &args);
        prop_assert_eq!(&decoded.env, &env);
    }

    // ── key/value ───────────────────────────────────────────────────

    #[test]
    fn key_value_total_on_arbitrary_bytes(
        content in prop::collection::vec(any::<u8>(), 0..512),
        sep in prop_oneof![Just(b':'), Just(b'='), Just(b' ')],
    ) {
        let _ = parse_key_value(&content, sep, |_, _| Ok(()));
    }

    /// Every generated line comes back as one pair, in order.
    #[test]
    fn key_value_yields_every_line(
        lines in prop::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,12}", "[a-z0-9 ]{0,16}"), 0..20),
    ) {
        let content: String = lines
            .iter()
            .map(|(k, v)| format!("{k}:\t{v}\n"))
            .collect();
        let mut seen = Vec::new();
        parse_key_value(content.as_bytes(), b':', |k, v| {
            seen.push((
                String::from_utf8_lossy(k).into_owned(),
                String::from_utf8_lossy(v).into_owned(),
            ));
            Ok(())
        })
        .unwrap();
        let expected: Vec<(String, String)> = lines
            .iter()
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn os_release_total_on_arbitrary_text(content in "[ -~\n]{0,300}") {
        let _ = parse_os_release(content.as_bytes());
    }

    // ── quantities and bitmasks ─────────────────────────────────────

    #[test]
    fn quantity_kilobytes_scale(n in 0u64..(u64::MAX / 1024)) {
        prop_assert_eq!(parse_quantity(format!("{n} kB").as_bytes()).unwrap(), n * 1024);
        prop_assert_eq!(parse_quantity(n.to_string().as_bytes()).unwrap(), n);
    }

    #[test]
    fn quantity_overflow_is_an_error(n in (u64::MAX / 1024 + 1)..u64::MAX) {
        let field = format!("{n} kB");
        prop_assert!(parse_quantity(field.as_bytes()).is_err());
    }

    /// One name per set bit, lowest first.
    #[test]
    fn bitmask_names_each_set_bit(mask in any::<u64>()) {
        let bits = decode_bitmask(&format!("{mask:016x}"), |bit| bit.to_string()).unwrap();
        prop_assert_eq!(bits.len(), mask.count_ones() as usize);
        let parsed: Vec<u32> = bits.iter().map(|b| b.parse().unwrap()).collect();
        prop_assert!(parsed.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(parsed.iter().all(|&bit| mask & (1 << bit) != 0));
    }

    // ── tabular ─────────────────────────────────────────────────────

    #[test]
    fn tabular_keeps_every_metric(
        metrics in prop::collection::btree_map("[a-z_]{1,20}", any::<u64>(), 0..30),
    ) {
        let content: String = metrics.iter().map(|(k, v)| format!("{k} {v}\n")).collect();
        prop_assert_eq!(parse_tabular(content.as_bytes()).unwrap(), metrics);
    }

    /// Signed counters survive as their two's complement.
    #[test]
    fn dual_line_counters(
        sections in prop::collection::btree_map(
            "[A-Z][a-zA-Z]{1,8}",
            prop::collection::btree_map("[A-Z][a-zA-Z]{1,12}", any::<i64>(), 1..10),
            1..5,
        ),
    ) {
        let mut content = String::new();
        for (section, metrics) in &sections {
            let keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
            let values: Vec<String> = metrics.values().map(i64::to_string).collect();
            content.push_str(&format!("{section}: {}\n", keys.join(" ")));
            content.push_str(&format!("{section}: {}\n", values.join(" ")));
        }

        let table = parse_dual_line_tabular(content.as_bytes()).unwrap();
        let expected: BTreeMap<String, BTreeMap<String, u64>> = sections
            .iter()
            .map(|(section, metrics)| {
                let metrics = metrics.iter().map(|(k, v)| (k.clone(), *v as u64)).collect();
                (section.clone(), metrics)
            })
            .collect();
        prop_assert_eq!(table, expected);
    }

    #[test]
    fn dual_line_total_on_arbitrary_text(content in "[ -~\n]{0,300}") {
        let _ = parse_dual_line_tabular(content.as_bytes());
    }

    // ── versions ────────────────────────────────────────────────────

    #[test]
    fn version_components_of_dotted_triple(
        major in 0u64..10_000,
        minor in 0u64..10_000,
        patch in 0u64..10_000,
        suffix in prop_oneof![Just(""), Just(" LTS"), Just(" (Core)"), Just(", Trusty Tahr")],
    ) {
        prop_assert_eq!(
            version_components(&format!("{major}.{minor}.{patch}{suffix}")),
            (major, minor, patch)
        );
    }
}
