//! Criterion benchmarks for `DiffEngine::compute_diff` on a 320×240 panel.
//!
//! Run: cargo bench -p frame-diff --bench compute_diff
//!
//! Cases per strategy:
//!   unchanged: identical frames (the common idle case)
//!   sparse: a blinking cursor and a clock digit
//!   dense: every other row rewritten, as when a list scrolls

#![allow(
    clippy::unwrap_used,           // benchmark helpers use unwrap for brevity
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    missing_docs,                  // criterion_group! macro generates undocumented items
)]

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use frame_diff::{DiffConfig, DiffEngine, Interlace};
use frame_diff_testing::TestFrame;

const WIDTH: usize = 320;
const HEIGHT: usize = 240;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scenes() -> Vec<(&'static str, TestFrame, TestFrame)> {
    let prev = TestFrame::filled(WIDTH, HEIGHT, 0x2104);

    let unchanged = prev.clone();

    let mut sparse = prev.clone();
    sparse.fill_rect(40, 200, 2, 16, 0xFFFF);
    sparse.fill_rect(280, 8, 12, 18, 0x07E0);

    let mut dense = prev.clone();
    for y in (0..HEIGHT).step_by(2) {
        for x in (y % 7..WIDTH).step_by(3) {
            dense.set_pixel(x, y, 0xF800);
        }
    }

    vec![
        ("unchanged", prev.clone(), unchanged),
        ("sparse", prev.clone(), sparse),
        ("dense", prev, dense),
    ]
}

fn configs() -> [(&'static str, DiffConfig); 4] {
    [
        ("scanline_exact", DiffConfig::DEFAULT),
        ("scanline_coarse", DiffConfig::FAST),
        ("bounding_box", DiffConfig::DMA_BOUNDING_BOX),
        ("full_frame", DiffConfig::DMA_FULL_FRAME),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_compute_diff(c: &mut Criterion) {
    let scenes = scenes();
    for (strategy, config) in configs() {
        let mut group = c.benchmark_group(strategy);
        group.measurement_time(Duration::from_secs(5));
        let mut engine = DiffEngine::new(WIDTH, HEIGHT, config).unwrap();
        for (scene, prev, cur) in &scenes {
            group.bench_with_input(BenchmarkId::new("scene", scene), &(prev, cur), |b, (prev, cur)| {
                b.iter(|| {
                    engine
                        .compute_diff(
                            black_box(cur.as_frame()),
                            black_box(prev.as_frame()),
                            true,
                            Interlace::Progressive,
                        )
                        .map(|list| list.total_size())
                });
            });
        }
        group.finish();
    }
}

fn bench_interlaced(c: &mut Criterion) {
    let scenes = scenes();
    let (_, prev, cur) = &scenes[2];
    let mut engine = DiffEngine::new(WIDTH, HEIGHT, DiffConfig::DEFAULT).unwrap();
    let mut parity = 0;
    c.bench_function("interlaced_dense_field", |b| {
        b.iter(|| {
            parity ^= 1;
            engine
                .compute_diff(cur.as_frame(), prev.as_frame(), true, Interlace::from_flags(true, parity))
                .map(|list| list.len())
        });
    });
}

criterion_group!(benches, bench_compute_diff, bench_interlaced);
criterion_main!(benches);
