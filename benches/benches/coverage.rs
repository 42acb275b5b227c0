// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_coverage::{CoverageConfig, CoverageMap, PixelRect, SharedCoverage};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_i32(&mut self, upper_exclusive: i32) -> i32 {
        if upper_exclusive <= 0 {
            return 0;
        }
        (self.next_u32() % upper_exclusive as u32) as i32
    }
}

/// A map whose central `inner` square is rendered, as after a zoom out.
fn zoomed_out(size: i32, inner: i32) -> CoverageMap {
    let mut map = CoverageMap::new(PixelRect::new(0, 0, size, size));
    let margin = (size - inner) / 2;
    map.mark_available(PixelRect::new(margin, margin, margin + inner, margin + inner));
    map
}

/// A rendered map with `holes` small unrendered squares scattered over it.
fn speckled(size: i32, holes: u32, seed: u64) -> CoverageMap {
    let mut map = CoverageMap::new(PixelRect::new(0, 0, size, size));
    map.mark_all_available();
    let mut rng = Lcg::new(seed);
    for _ in 0..holes {
        let x = rng.gen_range_i32(size - 4);
        let y = rng.gen_range_i32(size - 4);
        map.clear(PixelRect::new(x, y, x + 4, y + 4));
    }
    map
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_coverage");
    group.sample_size(50);

    for &size in &[256_i32, 1_024_i32, 4_096_i32] {
        let bounds = PixelRect::new(0, 0, size, size);

        let ring = zoomed_out(size, size / 2);
        group.bench_function(format!("uncovered_bbox_ring(size={size})"), |b| {
            b.iter(|| black_box(ring.uncovered_bbox(black_box(bounds))));
        });
        group.bench_function(format!("uncovered_rects_ring(size={size})"), |b| {
            b.iter(|| black_box(ring.uncovered_rects(black_box(bounds))));
        });

        let mut full = CoverageMap::new(bounds);
        full.mark_all_available();
        group.bench_function(format!("uncovered_rects_complete(size={size})"), |b| {
            b.iter(|| black_box(full.uncovered_rects(black_box(bounds))));
        });

        let speckles = speckled(size, 16, 0xC0E7_0000_0000_0001);
        group.bench_function(format!("uncovered_rects_speckled(size={size})"), |b| {
            b.iter(|| black_box(speckles.uncovered_rects(black_box(bounds))));
        });
        group.bench_function(format!("uncovered_bbox_trimap_speckled(size={size})"), |b| {
            b.iter(|| black_box(speckles.uncovered_bbox_trimap(black_box(bounds))));
        });

        group.bench_function(format!("report_speckled(size={size})"), |b| {
            b.iter(|| black_box(speckles.report(black_box(bounds))));
        });
    }

    group.finish();
}

fn bench_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_coverage_writes");
    group.sample_size(50);

    for &size in &[256_i32, 1_024_i32, 4_096_i32] {
        let bounds = PixelRect::new(0, 0, size, size);

        group.bench_function(format!("mark_available_tiles(size={size})"), |b| {
            b.iter_batched(
                || CoverageMap::with_config(bounds, CoverageConfig::SIMPLE),
                |mut map| {
                    for y in (0..size).step_by(64) {
                        for x in (0..size).step_by(64) {
                            map.mark_available(PixelRect::new(x, y, x + 64, y + 64));
                        }
                    }
                    black_box(map);
                },
                BatchSize::LargeInput,
            );
        });

        let source = speckled(size, 64, 0xC0E7_0000_0000_0002);
        group.bench_function(format!("copy_region(size={size})"), |b| {
            b.iter_batched(
                || CoverageMap::new(bounds),
                |mut map| {
                    map.copy_region_from(bounds, &source);
                    black_box(map);
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("claim_and_complete_tiles(size={size})"), |b| {
            b.iter_batched(
                || SharedCoverage::new(bounds),
                |shared| {
                    for y in (0..size).step_by(256) {
                        for x in (0..size).step_by(256) {
                            shared.claim(PixelRect::new(x, y, x + 256, y + 256)).complete();
                        }
                    }
                    black_box(shared);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_queries, bench_writes);
criterion_main!(benches);
