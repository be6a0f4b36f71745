//! Criterion benchmarks for the system-file and buffer parsers.
//!
//! Inputs are embedded so the benchmarks never touch the live `/proc`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hp_core::parse::{
    decode_procargs, encode_procargs, parse_capabilities, parse_dual_line_tabular, parse_meminfo,
    parse_os_release, parse_stat, parse_tabular,
};

const MEMINFO: &str = "\
MemTotal:       16314340 kB
MemFree:         1046628 kB
MemAvailable:    9543064 kB
Buffers:          642452 kB
Cached:          7605064 kB
SwapCached:         1024 kB
Active:          8035940 kB
Inactive:        5416684 kB
SwapTotal:       2097148 kB
SwapFree:        2080252 kB
Dirty:               236 kB
AnonPages:       5204180 kB
Mapped:           873268 kB
Shmem:            344528 kB
HugePages_Total:       0
Hugepagesize:       2048 kB
";

const SNMP: &str = "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors InAddrErrors ForwDatagrams InUnknownProtos InDiscards InDelivers OutRequests
Ip: 1 64 2349871 0 12 0 0 0 2349850 2011274
Icmp: InMsgs InErrors InCsumErrors InDestUnreachs OutMsgs OutErrors OutDestUnreachs
Icmp: 45 0 0 45 52 0 52
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab
Tcp: 1 200 120000 -1 18234 1244 302 911 17
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors
Udp: 80342 52 0 80410 0 0
";

const STATUS: &str = "\
Name:\tsystemd
Umask:\t0000
State:\tS (sleeping)
Tgid:\t1
PPid:\t0
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
VmRSS:\t   12800 kB
CapInh:\t0000000000000000
CapPrm:\t000001ffffffffff
CapEff:\t000001ffffffffff
CapBnd:\t000001ffffffffff
CapAmb:\t0000000000000000
NoNewPrivs:\t0
Seccomp:\t0
";

const OS_RELEASE: &str = r#"NAME="Ubuntu"
VERSION="22.04.3 LTS (Jammy Jellyfish)"
ID=ubuntu
ID_LIKE=debian
PRETTY_NAME="Ubuntu 22.04.3 LTS"
VERSION_ID="22.04"
VERSION_CODENAME=jammy
UBUNTU_CODENAME=jammy
"#;

fn bench_key_value_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_value");

    group.bench_function("parse_meminfo", |b| {
        b.iter(|| black_box(parse_meminfo(black_box(MEMINFO.as_bytes())).expect("meminfo")))
    });
    group.bench_function("parse_capabilities", |b| {
        b.iter(|| black_box(parse_capabilities(black_box(STATUS.as_bytes())).expect("status")))
    });
    group.bench_function("parse_os_release", |b| {
        b.iter(|| black_box(parse_os_release(black_box(OS_RELEASE.as_bytes())).expect("os-release")))
    });

    group.finish();
}

fn bench_tabular(c: &mut Criterion) {
    let vmstat: String = (0..200).map(|i| format!("counter_{i} {}\n", i * 977)).collect();

    let mut group = c.benchmark_group("tabular");
    group.bench_function("parse_tabular_vmstat", |b| {
        b.iter(|| black_box(parse_tabular(black_box(vmstat.as_bytes())).expect("vmstat")))
    });
    group.bench_function("parse_dual_line_snmp", |b| {
        b.iter(|| black_box(parse_dual_line_tabular(black_box(SNMP.as_bytes())).expect("snmp")))
    });
    group.finish();
}

fn bench_stat(c: &mut Criterion) {
    let simple = "12345 (bash) S 1 2 3 4 5 0 0 0 0 0 100 200 0 0 20 0 1 0 123456 1000000 1024 0";
    let tricky = "12345 (a) b (c)) S 1 2 3 4 5 0 0 0 0 0 100 200 0 0 20 0 1 0 123456 1000000 1024 0";

    let mut group = c.benchmark_group("stat");
    for (name, input) in [("simple_comm", simple), ("parens_in_comm", tricky)] {
        group.bench_with_input(BenchmarkId::new("parse_stat", name), &input, |b, input| {
            b.iter(|| black_box(parse_stat(black_box(input.as_bytes())).expect("stat")))
        });
    }
    group.finish();
}

fn bench_procargs(c: &mut Criterion) {
    let mut group = c.benchmark_group("procargs");

    for (nargs, nenv) in [(2usize, 10usize), (64, 100)] {
        let args: Vec<String> = (0..nargs).map(|i| format!("--flag-{i}=value")).collect();
        let env: Vec<(String, String)> = (0..nenv)
            .map(|i| (format!("VAR_{i}"), format!("/some/path/{i}")))
            .collect();
        let buf = encode_procargs("/usr/local/bin/server", &args, &env);

        group.bench_with_input(
            BenchmarkId::new("decode_procargs", format!("{nargs}args_{nenv}env")),
            &buf,
            |b, buf| b.iter(|| black_box(decode_procargs(black_box(buf)).expect("procargs"))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_key_value_files,
    bench_tabular,
    bench_stat,
    bench_procargs
);
criterion_main!(benches);
