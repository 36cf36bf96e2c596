// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for label detection and perspective correction.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use labelscan_core::{DetectionMode, DetectorConfig, Point, ProbabilityGrid, Quadrilateral};
use labelscan_document::{LabelDetector, PerspectiveCorrector};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full detection on a 256x256 grid holding one slightly skewed label with
/// some background noise.
fn bench_detection(c: &mut Criterion) {
    let grid = ProbabilityGrid::from_fn(256, 256, |x, y| {
        let (xf, yf) = (x as f32, y as f32);
        let inside = xf > 50.0 + yf * 0.1 && xf < 200.0 + yf * 0.1 && yf > 40.0 && yf < 210.0;
        let noise = ((x * 31 + y * 17) % 23) as f32 / 200.0;
        if inside { 0.9 - noise } else { noise }
    })
    .expect("valid grid");
    let detector = LabelDetector::new(DetectorConfig::default()).expect("default config");

    for mode in [DetectionMode::Live, DetectionMode::Final] {
        c.bench_function(&format!("detect {mode:?} (256x256)"), |b| {
            b.iter(|| black_box(detector.detect(black_box(&grid), mode)));
        });
    }
}

/// Warp a skewed quadrilateral out of a 1280x960 frame.
fn bench_perspective_correction(c: &mut Criterion) {
    let frame = DynamicImage::ImageRgb8(RgbImage::from_fn(1280, 960, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let quad = Quadrilateral::new([
        Point::new(220.0, 150.0),
        Point::new(1050.0, 210.0),
        Point::new(1000.0, 800.0),
        Point::new(180.0, 760.0),
    ]);
    let corrector = PerspectiveCorrector::default();

    c.bench_function("perspective_correction (1280x960)", |b| {
        b.iter(|| black_box(corrector.correct(black_box(&frame), &quad)));
    });
}

criterion_group!(benches, bench_detection, bench_perspective_correction);
criterion_main!(benches);
