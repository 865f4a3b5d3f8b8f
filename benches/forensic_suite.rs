use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use trustengine_forensics::{
    ForensicConfig, ForensicSuite, SourceImage,
    analysis::{compute_ela, compute_focus_heatmap, compute_noise_residual},
};

fn textured(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let v = ((x.wrapping_mul(2654435761) ^ y.wrapping_mul(40503)) >> 9) as u8;
        Rgb([v, v.wrapping_add(x as u8), v.wrapping_sub(y as u8)])
    })
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    for size in [128u32, 512] {
        let image = textured(size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("ela", size), &image, |b, image| {
            b.iter(|| compute_ela(black_box(image), 90, 30.0))
        });
        group.bench_with_input(BenchmarkId::new("noise", size), &image, |b, image| {
            b.iter(|| compute_noise_residual(black_box(image)))
        });
        group.bench_with_input(BenchmarkId::new("heatmap", size), &image, |b, image| {
            b.iter(|| compute_focus_heatmap(black_box(image)))
        });
    }

    group.finish();
}

fn bench_suite(c: &mut Criterion) {
    let source = SourceImage::from(textured(512));
    let mut group = c.benchmark_group("suite");

    for parallel in [false, true] {
        let suite = ForensicSuite::new(ForensicConfig::default().with_parallel(parallel))
            .expect("default config is valid");
        let label = if parallel { "parallel" } else { "sequential" };

        group.bench_function(label, |b| b.iter(|| suite.analyze(black_box(&source))));
    }

    group.finish();
}

criterion_group!(benches, bench_filters, bench_suite);
criterion_main!(benches);
