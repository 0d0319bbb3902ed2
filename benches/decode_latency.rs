//! Benchmarks for single-line decode latency
//!
//! Covers the accept path and the common reject paths so regressions in
//! either show up.
//!
//! Platform: Cross-platform, CI-safe

use aerolink::decoder;
use anyhow::{Context, Result};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn reference_line() -> Result<Vec<u8>> {
    let line = b"10042.75,251.125,-0.0625,0.875\r\n".to_vec();
    decoder::decode(&line).context("reference line must decode")?;
    Ok(line)
}

fn bench_decode_valid(c: &mut Criterion) {
    let line = reference_line().expect("reference line");

    c.bench_function("decode_valid_line", |b| b.iter(|| black_box(decoder::decode(black_box(&line)))));

    let padded = b"   10042.75 ,\t251.125, -0.0625 ,0.875   \n";
    c.bench_function("decode_padded_line", |b| b.iter(|| black_box(decoder::decode(black_box(padded)))));
}

fn bench_decode_rejects(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_reject");

    let cases: [(&str, Vec<u8>); 4] = [
        ("field_count", b"1,2,3\n".to_vec()),
        ("invalid_number", b"1,2,abc,4\n".to_vec()),
        ("non_finite", b"1,2,NaN,4\n".to_vec()),
        ("too_long", vec![b'9'; 2048]),
    ];

    for (name, line) in &cases {
        group.bench_function(*name, |b| b.iter(|| black_box(decoder::decode(black_box(line)))));
    }

    group.finish();
}

criterion_group!(benches, bench_decode_valid, bench_decode_rejects);
criterion_main!(benches);
