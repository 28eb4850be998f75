//! Criterion benchmarks for the drawing primitives.
//!
//! Shapes cover most of the bitmap so the per-pixel blend dominates.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rusty_bitmaps::{Colour, bench_utils};

const COLOUR: Colour = Colour::new(90, 140, 200);

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    for size in bench_utils::BENCH_SIZES {
        let mut bitmap = bench_utils::create_test_bitmap(size, size);
        group.throughput(Throughput::Elements((size as u64) * (size as u64)));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| black_box(&mut bitmap).fill(COLOUR));
        });
    }
    group.finish();
}

fn bench_rectangle_1024(c: &mut Criterion) {
    let mut group = c.benchmark_group("rectangle_1024");
    let size = 1024;
    for mode in bench_utils::BENCH_MODES {
        let mut bitmap = bench_utils::create_test_bitmap(size, size);
        group.throughput(Throughput::Elements((size as u64) * (size as u64)));
        group.bench_function(
            BenchmarkId::new(bench_utils::mode_to_string(mode), size),
            |b| {
                b.iter(|| {
                    black_box(&mut bitmap).draw_rectangle(COLOUR, 0, size, 0, size, mode);
                });
            },
        );
    }
    group.finish();
}

fn bench_circle_1024(c: &mut Criterion) {
    let mut group = c.benchmark_group("circle_1024");
    let size = 1024;
    for mode in bench_utils::BENCH_MODES {
        let mut bitmap = bench_utils::create_test_bitmap(size, size);
        group.throughput(Throughput::Elements((size as u64) * (size as u64)));
        group.bench_function(
            BenchmarkId::new(bench_utils::mode_to_string(mode), size),
            |b| {
                b.iter(|| {
                    black_box(&mut bitmap).draw_circle(COLOUR, size / 2, size / 2, size / 2, mode);
                });
            },
        );
    }
    group.finish();
}

fn bench_lines_1024(c: &mut Criterion) {
    let mut group = c.benchmark_group("lines_1024");
    let size = 1024;
    let mut bitmap = bench_utils::create_test_bitmap(size, size);
    group.bench_function("diagonals", |b| {
        b.iter(|| {
            let bitmap = black_box(&mut bitmap);
            for offset in (0..size).step_by(16) {
                bitmap.draw_line(COLOUR, 0, offset, size - 1, size - 1 - offset, Default::default());
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_fill,
    bench_rectangle_1024,
    bench_circle_1024,
    bench_lines_1024
);
criterion_main!(benches);
