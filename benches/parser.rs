//! Stream throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mochi_vt::{Options, TerminalIo};

fn termio() -> TerminalIo {
    TerminalIo::new(Options {
        cols: 80,
        rows: 24,
        modes: None,
    })
}

fn bench_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    let plain_text = "Hello, World! ".repeat(1000);
    group.throughput(Throughput::Bytes(plain_text.len() as u64));

    group.bench_function("plain_text", |b| {
        b.iter(|| {
            let mut io = termio();
            io.process_output(black_box(plain_text.as_bytes())).unwrap();
            black_box(io)
        })
    });

    group.finish();
}

fn bench_csi_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    let csi_heavy = "\x1b[1mRed\x1b[0m \x1b[5;10H\x1b[2J".repeat(100);
    group.throughput(Throughput::Bytes(csi_heavy.len() as u64));

    group.bench_function("csi_sequences", |b| {
        b.iter(|| {
            let mut io = termio();
            io.process_output(black_box(csi_heavy.as_bytes())).unwrap();
            black_box(io)
        })
    });

    group.finish();
}

fn bench_mixed_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    let mixed = "Line 1: \x1b[1mOK\x1b[0m\r\nLine 2: \x1b[9mGONE\x1b[0m\r\n".repeat(500);
    group.throughput(Throughput::Bytes(mixed.len() as u64));

    group.bench_function("mixed_content", |b| {
        b.iter(|| {
            let mut io = termio();
            io.process_output(black_box(mixed.as_bytes())).unwrap();
            black_box(io)
        })
    });

    group.finish();
}

fn bench_utf8_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    let utf8_text = "héllo wörld 你好世界 ".repeat(500);
    group.throughput(Throughput::Bytes(utf8_text.len() as u64));

    group.bench_function("utf8_text", |b| {
        b.iter(|| {
            let mut io = termio();
            io.process_output(black_box(utf8_text.as_bytes())).unwrap();
            black_box(io)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_plain_text,
    bench_csi_sequences,
    bench_mixed_content,
    bench_utf8_text
);
criterion_main!(benches);
