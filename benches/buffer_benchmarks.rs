// benches/buffer_benchmarks.rs
// Micro-benchmarks for the buffered read and write paths.
// Compares token scanning, framing and bypass writes across capacities,
// with std::io::BufReader as the baseline for line splitting.

use bufchain::{framing, scan, BufferedInput, BufferedOutput, InputBuffer, MemoryResource, OutputBuffer, Sink};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::{BufRead, BufReader, Cursor};

const LINES: usize = 1000;

fn make_lines(count: usize) -> Vec<u8> {
    let mut text = Vec::with_capacity(count * 24);
    for i in 0..count {
        text.extend_from_slice(format!("event-{i:06},value={}\n", i * 7).as_bytes());
    }
    text
}

fn make_frames(count: usize) -> Vec<u8> {
    let mut out = OutputBuffer::with_capacity(MemoryResource::new(), 4096);
    for i in 0..count {
        framing::append_frame(&mut out, format!("payload-{i}").as_bytes()).unwrap();
    }
    out.flush().unwrap();
    out.into_inner().into_contents()
}

// Read path

fn bench_line_scanning(c: &mut Criterion) {
    let text = make_lines(LINES);
    let mut group = c.benchmark_group("Read Path/line_scan_1000");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for capacity in [64usize, 1024, 8192] {
        group.bench_with_input(BenchmarkId::new("bufchain_next", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes(text.clone()), capacity);
                let mut count = 0;
                while let Some(line) = input.next(&mut scan::line()).unwrap() {
                    count += line.len();
                }
                black_box(count);
            });
        });
    }

    group.bench_function("std_bufreader_read_until", |b| {
        b.iter(|| {
            let mut reader = BufReader::with_capacity(1024, Cursor::new(text.clone()));
            let mut line = Vec::new();
            let mut count = 0;
            while reader.read_until(b'\n', &mut line).unwrap() > 0 {
                count += line.len();
                line.clear();
            }
            black_box(count);
        });
    });

    group.finish();
}

fn bench_frame_reading(c: &mut Criterion) {
    let frames = make_frames(LINES);
    let mut group = c.benchmark_group("Read Path/next_frame_1000");
    group.throughput(Throughput::Bytes(frames.len() as u64));

    for max_transfer in [0usize, 7] {
        group.bench_with_input(BenchmarkId::new("max_transfer", max_transfer), &max_transfer, |b, &max| {
            b.iter(|| {
                let source = MemoryResource::from_bytes(frames.clone()).with_max_transfer(max);
                let mut input = InputBuffer::with_capacity(source, 512);
                let mut count = 0;
                while let Some(payload) = framing::next_frame(&mut input).unwrap() {
                    count += payload.len();
                }
                black_box(count);
            });
        });
    }

    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    let data = vec![0xA5u8; 1 << 20];
    let mut group = c.benchmark_group("Read Path/fill_1MiB");
    group.throughput(Throughput::Bytes(data.len() as u64));

    // Small destinations go through the region, large ones bypass it.
    for chunk in [16usize, 4096, 65536] {
        group.bench_with_input(BenchmarkId::new("dst", chunk), &chunk, |b, &chunk| {
            let mut dst = vec![0u8; chunk];
            b.iter(|| {
                let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes(data.clone()), 8192);
                let mut total = 0;
                while let Some(n) = input.fill(&mut dst).unwrap() {
                    total += n;
                }
                black_box(total);
            });
        });
    }

    group.finish();
}

// Write path

fn bench_appends(c: &mut Criterion) {
    let text = make_lines(LINES);
    let mut group = c.benchmark_group("Write Path/append_1000");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for capacity in [64usize, 1024, 8192] {
        group.bench_with_input(BenchmarkId::new("bufchain_append", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut backing = vec![0u8; text.len()];
                let device = bufchain::IoResource::new(Cursor::new(&mut backing[..]));
                let mut out = OutputBuffer::with_capacity(device, capacity);
                for line in text.split_inclusive(|&byte| byte == b'\n') {
                    out.append(line).unwrap();
                }
                out.flush().unwrap();
                black_box(out.readable());
            });
        });
    }

    group.bench_function("bufchain_bypass", |b| {
        b.iter(|| {
            let mut backing = vec![0u8; text.len()];
            let device = bufchain::IoResource::new(Cursor::new(&mut backing[..]));
            let mut out = OutputBuffer::with_capacity(device, 16);
            out.append(&text).unwrap();
            black_box(out.readable());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_line_scanning,
    bench_frame_reading,
    bench_fill,
    bench_appends
);
criterion_main!(benches);
