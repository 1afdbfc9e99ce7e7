use criterion::{criterion_group, criterion_main, Criterion};
use fftreg::{
    estimate_translation, normalized_correlation, smoothing_recursive_gaussian, CorrelationParams,
    EstimateConfig, Grid, Image, Sigma,
};
use std::hint::black_box;

fn make_image<const D: usize>(size: [usize; D], shift: usize) -> Image<D> {
    Image::from_fn(Grid::new(size).unwrap(), |index| {
        let x = index[0] + shift;
        let y = index.get(1).copied().unwrap_or(0);
        let z = index.get(2).copied().unwrap_or(0);
        (((x * 13) ^ (y * 7) ^ (z * 5) ^ (x * y)) & 0xFF) as f32
    })
}

fn bench_estimate(c: &mut Criterion) {
    let fixed = make_image([256, 256], 0);
    let moving = make_image([256, 256], 9);
    let config = EstimateConfig::default();
    c.bench_function("estimate_translation_256x256", |b| {
        b.iter(|| estimate_translation(black_box(&fixed), black_box(&moving), &config).unwrap())
    });

    let masked = EstimateConfig::default().with_masked_pixel_value(0.0);
    c.bench_function("estimate_translation_masked_256x256", |b| {
        b.iter(|| estimate_translation(black_box(&fixed), black_box(&moving), &masked).unwrap())
    });

    let fixed3 = make_image([64, 64, 48], 0);
    let moving3 = make_image([64, 64, 48], 3);
    let config3 = EstimateConfig::default();
    c.bench_function("estimate_translation_64x64x48", |b| {
        b.iter(|| estimate_translation(black_box(&fixed3), black_box(&moving3), &config3).unwrap())
    });
}

fn bench_stages(c: &mut Criterion) {
    let image = make_image([512, 512], 0);
    c.bench_function("recursive_gaussian_512x512", |b| {
        b.iter(|| smoothing_recursive_gaussian(black_box(&image), Sigma::Isotropic(2.0)).unwrap())
    });

    let fixed = make_image([256, 256], 0);
    let moving = make_image([256, 256], 5);
    c.bench_function("normalized_correlation_256x256", |b| {
        b.iter(|| {
            normalized_correlation(black_box(&fixed), black_box(&moving), CorrelationParams::default())
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_estimate, bench_stages);
criterion_main!(benches);
