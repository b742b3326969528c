use std::hint::black_box;
use std::io::{BufReader, Cursor};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use file_factory::services::{compute_hash_in, count_lines_in};

/// Synthetic text with mixed line endings, roughly `size` bytes long
fn generate_text(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size + 64);
    let mut i = 0usize;
    while data.len() < size {
        data.extend_from_slice(format!("line {} of the benchmark input", i).as_bytes());
        data.extend_from_slice(match i % 3 {
            0 => b"\n".as_slice(),
            1 => b"\r\n".as_slice(),
            _ => b"\r".as_slice(),
        });
        i += 1;
    }
    data
}

fn bench_count_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_lines_in");

    for size in [4 * 1024, 256 * 1024, 4 * 1024 * 1024].iter() {
        let data = generate_text(*size);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                count_lines_in(BufReader::with_capacity(64 * 1024, Cursor::new(black_box(&data))))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_compute_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_hash_in");
    let data = generate_text(1024 * 1024);

    for buffer_size in [512usize, 8 * 1024, 64 * 1024].iter() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            buffer_size,
            |b, &buffer_size| {
                b.iter(|| compute_hash_in(Cursor::new(black_box(&data)), buffer_size).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_count_lines, bench_compute_hash);
criterion_main!(benches);
