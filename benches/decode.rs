//! Benchmarks for the per-frame CPU paths: unpacking, painting, opacity.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

use lifeview::unpack::{pack_bits, unpack_bytes, unpack_row};
use lifeview::{
    DecayLadder, FrameRecorder, GridDims, ParticleLattice, PixelBuffer, PixelDecayPainter, Snapshot2D, Snapshot3D,
    VoxelAlphaBuffer,
};

fn random_cells(len: usize) -> Vec<bool> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_bool(0.3)).collect()
}

fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack");

    for width in [8u32, 53, 64] {
        let units = pack_bits(&random_cells(1024), width).unwrap();
        group.bench_with_input(BenchmarkId::new("row_1024", width), &units, |b, units| {
            b.iter(|| black_box(unpack_row(units, width)))
        });
    }

    let bytes: Vec<u8> = (0..128).map(|i| i as u8).collect();
    group.bench_function("bytes_1024", |b| b.iter(|| black_box(unpack_bytes(&bytes))));

    group.finish();
}

fn bench_paint(c: &mut Criterion) {
    let mut group = c.benchmark_group("paint");

    for size in [64usize, 256, 512] {
        let frames: Vec<Snapshot2D> = (0..4)
            .map(|_| Snapshot2D::from_cells(size, &random_cells(size * size)).unwrap())
            .collect();
        let mut painter = PixelDecayPainter::new(size, size, DecayLadder::default(), [0x77, 0xCA, 0xE6]);
        let mut pixels = PixelBuffer::new(size, size);
        let mut i = 0;

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                i = (i + 1) % frames.len();
                black_box(painter.paint(&mut pixels, &frames[i]))
            })
        });
    }

    group.finish();
}

fn bench_opacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("opacity");

    for dims in [GridDims::new(8, 32, 32), GridDims::new(16, 64, 64)] {
        let cells = random_cells(dims.volume());
        let snapshot = Snapshot3D::from_fn(dims, |l, r, c| cells[(l * dims.height + r) * dims.width + c]);
        let mut lattice = ParticleLattice::new(3.0, 10.0);
        let mut alpha = VoxelAlphaBuffer::new(0.8);
        let mut target = FrameRecorder::new();

        group.bench_with_input(BenchmarkId::from_parameter(dims.volume()), &snapshot, |b, snapshot| {
            b.iter(|| {
                let _ = black_box(alpha.update(&mut lattice, snapshot, &mut target));
                alpha.flush(&mut target);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_unpack, bench_paint, bench_opacity);
criterion_main!(benches);
