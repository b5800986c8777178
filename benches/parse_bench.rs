//! Criterion benchmarks for the hop line parser

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tracemap::trace::{Dialect, HopLineParser};

fn bench_parse(c: &mut Criterion) {
    let tracert = HopLineParser::new(Dialect::Tracert);
    let traceroute = HopLineParser::new(Dialect::Traceroute);

    c.bench_function("parse_tracert_hop", |b| {
        b.iter(|| tracert.parse_line(black_box("  3    12 ms    14 ms    13 ms  93.184.216.34")))
    });

    c.bench_function("parse_traceroute_hop", |b| {
        b.iter(|| {
            traceroute.parse_line(black_box(
                " 1  router.local (192.168.1.1)  0.523 ms  0.610 ms  0.544 ms",
            ))
        })
    });

    c.bench_function("parse_timeout_line", |b| {
        b.iter(|| traceroute.parse_line(black_box(" 7  * * *")))
    });

    c.bench_function("parse_noise_line", |b| {
        b.iter(|| tracert.parse_line(black_box("Tracing route to example.com [93.184.216.34]")))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
