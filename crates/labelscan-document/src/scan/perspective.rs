// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective correction: warp a detected label quadrilateral onto an
// upright rectangle.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use labelscan_core::{CorrectionConfig, InterpolationKind, Point, Quadrilateral};
use tracing::{debug, info, instrument, warn};

/// Quads with less area than this (in source pixels) are not warped.
const MIN_QUAD_AREA: f32 = 1.0;

/// Warps source-image quadrilaterals to rectangles.
#[derive(Debug, Clone)]
pub struct PerspectiveCorrector {
    interpolation: Interpolation,
    background: Rgba<u8>,
}

/// A rectified label and the transform that produced it.
#[derive(Debug, Clone)]
pub struct CorrectionResult {
    pub image: DynamicImage,
    /// Maps source coordinates to corrected coordinates.
    pub projection: Projection,
    pub width: u32,
    pub height: u32,
}

impl CorrectionResult {
    /// Corrected-image point back to the source image.
    pub fn to_source(&self, point: Point) -> Point {
        let (x, y) = self.projection.invert() * point.as_tuple();
        Point::new(x, y)
    }

    /// Source-image point into the corrected image.
    pub fn to_corrected(&self, point: Point) -> Point {
        let (x, y) = self.projection * point.as_tuple();
        Point::new(x, y)
    }
}

impl PerspectiveCorrector {
    pub fn new(config: &CorrectionConfig) -> Self {
        let interpolation = match config.interpolation {
            InterpolationKind::Nearest => Interpolation::Nearest,
            InterpolationKind::Bilinear => Interpolation::Bilinear,
            InterpolationKind::Bicubic => Interpolation::Bicubic,
        };
        Self {
            interpolation,
            background: Rgba(config.background),
        }
    }

    /// Output size for `quad`: the mean of the top and bottom edge lengths by
    /// the mean of the left and right edge lengths, rounded.
    pub fn target_size(quad: &Quadrilateral) -> Option<(u32, u32)> {
        let top = quad.top_left().distance(&quad.top_right());
        let bottom = quad.bottom_left().distance(&quad.bottom_right());
        let left = quad.top_left().distance(&quad.bottom_left());
        let right = quad.top_right().distance(&quad.bottom_right());

        let width = ((top + bottom) / 2.0).round();
        let height = ((left + right) / 2.0).round();
        if !(width >= 1.0 && height >= 1.0) {
            return None;
        }
        Some((width as u32, height as u32))
    }

    /// Warp `quad` (in `image` pixel coordinates, canonical corner order) to
    /// an upright rectangle.
    ///
    /// Returns `None` when the quad is degenerate or no projective transform
    /// exists for it. Pixels sampled from outside the source take the
    /// configured background colour.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn correct(&self, image: &DynamicImage, quad: &Quadrilateral) -> Option<CorrectionResult> {
        if quad.area() < MIN_QUAD_AREA {
            warn!(area = quad.area(), "Quadrilateral has no area; not correcting");
            return None;
        }
        let Some((out_w, out_h)) = Self::target_size(quad) else {
            warn!("Quadrilateral collapses to an empty rectangle; not correcting");
            return None;
        };

        let src = quad.to_tuples();
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ];
        let Some(projection) = Projection::from_control_points(src, dest) else {
            warn!(?src, "Failed to compute projective transform");
            return None;
        };
        debug!(out_w, out_h, "Projective transform computed");

        let rgba_input = image.to_rgba8();
        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(
            &rgba_input,
            &projection,
            self.interpolation,
            self.background,
            &mut output,
        );

        let image = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(output)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(output).to_rgb8())
        };

        info!(out_w, out_h, "Perspective correction applied");
        Some(CorrectionResult {
            image,
            projection,
            width: out_w,
            height: out_h,
        })
    }
}

impl Default for PerspectiveCorrector {
    fn default() -> Self {
        Self::new(&CorrectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point as PixelPoint;

    const RED: Rgb<u8> = Rgb([200, 20, 20]);

    fn quad(points: [(f32, f32); 4]) -> Quadrilateral {
        Quadrilateral::new(points.map(|(x, y)| Point::new(x, y)))
    }

    /// A white canvas with a red label drawn at the given corners.
    fn canvas_with_label(corners: [(f32, f32); 4]) -> DynamicImage {
        let mut canvas = RgbImage::from_pixel(240, 200, Rgb([255, 255, 255]));
        let poly: Vec<PixelPoint<i32>> = corners
            .iter()
            .map(|&(x, y)| PixelPoint::new(x as i32, y as i32))
            .collect();
        draw_polygon_mut(&mut canvas, &poly, RED);
        DynamicImage::ImageRgb8(canvas)
    }

    #[test]
    fn target_size_averages_opposite_edges() {
        let q = quad([(10.0, 10.0), (110.0, 10.0), (110.0, 60.0), (10.0, 60.0)]);
        assert_eq!(PerspectiveCorrector::target_size(&q), Some((100, 50)));

        let trapezoid = quad([(20.0, 0.0), (80.0, 0.0), (100.0, 40.0), (0.0, 40.0)]);
        let (w, h) = PerspectiveCorrector::target_size(&trapezoid).expect("non-empty");
        assert_eq!(w, 80);
        assert!((41..=45).contains(&h));
    }

    #[test]
    fn axis_aligned_rectangle_is_cropped() {
        let corners = [(10.0, 10.0), (110.0, 10.0), (110.0, 60.0), (10.0, 60.0)];
        let image = canvas_with_label(corners);
        let result = PerspectiveCorrector::default()
            .correct(&image, &quad(corners))
            .expect("valid quad");
        assert_eq!((result.width, result.height), (100, 50));
        assert_eq!((result.image.width(), result.image.height()), (100, 50));
        assert_eq!(result.image.to_rgb8().get_pixel(50, 25), &RED);
    }

    #[test]
    fn skewed_label_is_rectified() {
        let corners = [(40.0, 30.0), (190.0, 50.0), (175.0, 160.0), (30.0, 135.0)];
        let image = canvas_with_label(corners);
        let result = PerspectiveCorrector::default()
            .correct(&image, &quad(corners))
            .expect("valid quad");

        let rgb = result.image.to_rgb8();
        let (w, h) = (result.width, result.height);
        for (x, y) in [(w / 2, h / 2), (w / 4, h / 4), (3 * w / 4, 3 * h / 4)] {
            assert_eq!(rgb.get_pixel(x, y), &RED, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn corners_round_trip_through_the_projection() {
        let corners = [(40.0, 30.0), (190.0, 50.0), (175.0, 160.0), (30.0, 135.0)];
        let q = quad(corners);
        let result = PerspectiveCorrector::default()
            .correct(&canvas_with_label(corners), &q)
            .expect("valid quad");
        let (w, h) = (result.width as f32, result.height as f32);
        let rect = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        for (corner, target) in q.corners.iter().zip(rect) {
            let mapped = result.to_corrected(*corner);
            assert!(mapped.distance(&Point::new(target.0, target.1)) < 0.5, "{mapped:?}");
            let back = result.to_source(mapped);
            assert!(back.distance(corner) < 0.5, "{back:?} vs {corner:?}");
        }
    }

    #[test]
    fn outside_samples_use_the_background() {
        let config = CorrectionConfig {
            background: [0, 0, 255, 255],
            ..CorrectionConfig::default()
        };
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
        // Reaches past the right edge of the 50x50 source.
        let q = quad([(20.0, 10.0), (90.0, 10.0), (90.0, 40.0), (20.0, 40.0)]);
        let result = PerspectiveCorrector::new(&config)
            .correct(&image, &q)
            .expect("valid quad");
        let rgb = result.image.to_rgb8();
        assert_eq!(rgb.get_pixel(5, 15), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(65, 15), &Rgb([0, 0, 255]));
    }

    #[test]
    fn alpha_is_kept_only_when_present() {
        let q = quad([(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)]);
        let corrector = PerspectiveCorrector::default();

        let opaque = DynamicImage::ImageRgb8(RgbImage::new(30, 30));
        let out = corrector.correct(&opaque, &q).expect("valid quad");
        assert!(!out.image.color().has_alpha());

        let translucent = DynamicImage::ImageRgba8(RgbaImage::new(30, 30));
        let out = corrector.correct(&translucent, &q).expect("valid quad");
        assert!(out.image.color().has_alpha());
    }

    #[test]
    fn degenerate_quads_are_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(50, 50));
        let corrector = PerspectiveCorrector::default();

        let point = Quadrilateral::new([Point::new(10.0, 10.0); 4]);
        assert!(PerspectiveCorrector::target_size(&point).is_none());
        assert!(corrector.correct(&image, &point).is_none());

        let line = quad([(0.0, 0.0), (10.0, 0.0), (30.0, 0.0), (20.0, 0.0)]);
        assert!(corrector.correct(&image, &line).is_none());
    }
}
