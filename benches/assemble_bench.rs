//! Criterion benchmarks for grid build, assembly and brush edits.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cubemarch::{apply_brush, Brush, EditMode, FieldGenerator, Grid, Mesher, Pt3, Vec3};

fn noise() -> FieldGenerator {
    FieldGenerator::Noise3d {
        offset: Vec3::new(3.1, 7.4, 1.9),
        scale: 0.12,
    }
}

fn make_grid(size: f32) -> Grid {
    Grid::build(Pt3::origin(), Vec3::repeat(size), 1.0, &noise()).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_build");
    for size in [16.0f32, 32.0, 64.0] {
        group.throughput(Throughput::Elements((size as u64).pow(3)));
        group.bench_with_input(BenchmarkId::from_parameter(size as u32), &size, |b, &size| {
            b.iter(|| black_box(make_grid(black_box(size))))
        });
    }
    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    for size in [16.0f32, 32.0, 64.0] {
        let mut grid = make_grid(size);
        let mut mesher = Mesher::new();
        group.throughput(Throughput::Elements(grid.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(size as u32), |b| {
            b.iter(|| black_box(mesher.assemble(&mut grid, 0.5, false).triangle_count()))
        });
    }
    group.finish();
}

fn bench_edit(c: &mut Criterion) {
    let mut grid = make_grid(32.0);
    let brush = Brush::new(Pt3::new(16.0, 16.0, 16.0), 3.0, 0.5);

    c.bench_function("brush_edit_r3", |b| {
        b.iter(|| black_box(apply_brush(&mut grid, black_box(&brush), 0.016, EditMode::Add)))
    });
}

criterion_group!(benches, bench_build, bench_assemble, bench_edit);
criterion_main!(benches);
