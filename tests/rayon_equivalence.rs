#![cfg(feature = "rayon")]

use fftreg::{estimate_translation_with_report, normalized_correlation, CorrelationParams, EstimateConfig, Grid, Image};
use rayon::prelude::*;

fn make_volume(size: [usize; 3], shift: [usize; 3]) -> Image<3> {
    Image::from_fn(Grid::new(size).unwrap(), |[x, y, z]| {
        let (x, y, z) = (x + shift[0], y + shift[1], z + shift[2]);
        (((x * 11) ^ (y * 3) ^ (z * 7) ^ (x * y)) & 0xFF) as f32
    })
}

#[test]
fn parallel_fft_is_deterministic() {
    let fixed = make_volume([20, 18, 12], [0, 0, 0]);
    let moving = make_volume([20, 18, 12], [2, 0, 1]);
    let params = CorrelationParams {
        required_fraction_of_overlapping_pixels: 0.3,
    };
    let first = normalized_correlation(&fixed, &moving, params).unwrap();
    let second = normalized_correlation(&fixed, &moving, params).unwrap();
    assert_eq!(first, second);

    // fixed(x) == moving(x - s) with s = (2, 0, 1)
    let zero_shift = [19 + 2, 17, 11 + 1];
    let value = first.get(zero_shift).unwrap();
    assert!((value - 1.0).abs() < 1e-4, "got {value}");
}

#[test]
fn concurrent_estimates_agree() {
    let fixed = make_volume([24, 24, 16], [0, 0, 0]);
    let moving = make_volume([24, 24, 16], [3, 1, 0]);
    let config = EstimateConfig::default().with_required_overlap(0.3);

    let reports: Vec<_> = (0..4)
        .into_par_iter()
        .map(|_| estimate_translation_with_report(&fixed, &moving, &config).unwrap())
        .collect();
    for report in &reports[1..] {
        assert_eq!(report, &reports[0]);
    }
    let t = reports[0].transform.translation();
    // moving(x) == fixed(x + shift), so fixed features sit at x - shift in moving
    assert!((t[0] + 3.0).abs() < 0.5, "got {t:?}");
    assert!((t[1] + 1.0).abs() < 0.5, "got {t:?}");
    assert!(t[2].abs() < 0.5, "got {t:?}");
}
