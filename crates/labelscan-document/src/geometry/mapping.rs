// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the three spaces a detection lives in:
//
// - model space: the fixed probability grid
// - analysis space: the upright camera frame (sensor frame rotated clockwise)
// - source space: the raw sensor image
//
// All mappings keep corner identity; they never reorder corners.

use labelscan_core::{Point, Quadrilateral, Rotation};

/// Scale a quadrilateral between two differently sized grids.
pub fn scale_quad(quad: &Quadrilateral, from: (u32, u32), to: (u32, u32)) -> Quadrilateral {
    let sx = to.0 as f32 / from.0.max(1) as f32;
    let sy = to.1 as f32 / from.1.max(1) as f32;
    quad.map(|p| Point::new(p.x * sx, p.y * sy))
}

/// Grow a quadrilateral outward from its centroid by `ratio` and clamp each
/// coordinate to `[0, max_x]` / `[0, max_y]`.
///
/// The result is for display only. After clamping it no longer follows the
/// true document edge and must not be used for cropping.
pub fn expand_from_centroid(
    quad: &Quadrilateral,
    ratio: f32,
    max_x: f32,
    max_y: f32,
) -> Quadrilateral {
    let c = quad.centroid();
    let factor = 1.0 + ratio;
    quad.map(|p| {
        Point::new(
            (c.x + (p.x - c.x) * factor).clamp(0.0, max_x),
            (c.y + (p.y - c.y) * factor).clamp(0.0, max_y),
        )
    })
}

/// Map a point from the sensor image into the upright analysis frame.
///
/// `sensor_size` is the size of the sensor image; the analysis frame has the
/// same size, or its transpose for 90/270.
pub fn sensor_to_analysis(p: Point, rotation: Rotation, sensor_size: (u32, u32)) -> Point {
    let (w, h) = (sensor_size.0 as f32, sensor_size.1 as f32);
    match rotation {
        Rotation::Deg0 => p,
        Rotation::Deg90 => Point::new(h - p.y, p.x),
        Rotation::Deg180 => Point::new(w - p.x, h - p.y),
        Rotation::Deg270 => Point::new(p.y, w - p.x),
    }
}

/// Inverse of [`sensor_to_analysis`].
pub fn analysis_to_sensor(p: Point, rotation: Rotation, sensor_size: (u32, u32)) -> Point {
    let (w, h) = (sensor_size.0 as f32, sensor_size.1 as f32);
    match rotation {
        Rotation::Deg0 => p,
        Rotation::Deg90 => Point::new(p.y, h - p.x),
        Rotation::Deg180 => Point::new(w - p.x, h - p.y),
        Rotation::Deg270 => Point::new(w - p.y, p.x),
    }
}

/// Stateless mapper for one camera configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    model_size: (u32, u32),
    sensor_size: (u32, u32),
    rotation: Rotation,
}

impl CoordinateMapper {
    pub fn new(model_size: (u32, u32), sensor_size: (u32, u32), rotation: Rotation) -> Self {
        Self {
            model_size,
            sensor_size,
            rotation,
        }
    }

    pub fn model_size(&self) -> (u32, u32) {
        self.model_size
    }

    pub fn sensor_size(&self) -> (u32, u32) {
        self.sensor_size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Size of the upright analysis frame.
    pub fn analysis_size(&self) -> (u32, u32) {
        if self.rotation.swaps_dimensions() {
            (self.sensor_size.1, self.sensor_size.0)
        } else {
            self.sensor_size
        }
    }

    pub fn model_to_analysis(&self, quad: &Quadrilateral) -> Quadrilateral {
        scale_quad(quad, self.model_size, self.analysis_size())
    }

    pub fn analysis_to_model(&self, quad: &Quadrilateral) -> Quadrilateral {
        scale_quad(quad, self.analysis_size(), self.model_size)
    }

    pub fn analysis_to_source(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.map(|p| analysis_to_sensor(p, self.rotation, self.sensor_size))
    }

    pub fn source_to_analysis(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.map(|p| sensor_to_analysis(p, self.rotation, self.sensor_size))
    }

    pub fn model_to_source(&self, quad: &Quadrilateral) -> Quadrilateral {
        self.analysis_to_source(&self.model_to_analysis(quad))
    }

    pub fn source_to_model(&self, quad: &Quadrilateral) -> Quadrilateral {
        self.analysis_to_model(&self.source_to_analysis(quad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    fn square(x0: f32, y0: f32, side: f32) -> Quadrilateral {
        Quadrilateral::new([
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    #[test]
    fn scales_between_grids() {
        let quad = square(64.0, 64.0, 128.0);
        let scaled = scale_quad(&quad, (256, 256), (480, 640));
        assert!(approx(scaled.top_left(), Point::new(120.0, 160.0)));
        assert!(approx(scaled.bottom_right(), Point::new(360.0, 480.0)));
    }

    #[test]
    fn expansion_grows_from_centroid() {
        let quad = square(100.0, 100.0, 100.0);
        let grown = expand_from_centroid(&quad, 0.02, 256.0, 256.0);
        assert!(approx(grown.top_left(), Point::new(99.0, 99.0)));
        assert!(approx(grown.bottom_right(), Point::new(201.0, 201.0)));
        assert_eq!(grown.centroid(), quad.centroid());
    }

    #[test]
    fn expansion_clamps_to_bounds() {
        let quad = square(0.0, 0.0, 256.0);
        let grown = expand_from_centroid(&quad, 0.1, 256.0, 256.0);
        assert_eq!(grown.top_left(), Point::new(0.0, 0.0));
        assert_eq!(grown.bottom_right(), Point::new(256.0, 256.0));
    }

    #[test]
    fn rotation_round_trips() {
        let sensor = (640, 480);
        let p = Point::new(100.0, 30.0);
        for rotation in [
            Rotation::Deg0,
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
        ] {
            let there = sensor_to_analysis(p, rotation, sensor);
            let back = analysis_to_sensor(there, rotation, sensor);
            assert!(approx(back, p), "{rotation:?}: {back:?}");
        }
    }

    #[test]
    fn quarter_turn_sends_sensor_origin_to_analysis_top_right() {
        // 640x480 sensor rotated clockwise gives a 480x640 upright frame.
        let p = sensor_to_analysis(Point::new(0.0, 0.0), Rotation::Deg90, (640, 480));
        assert!(approx(p, Point::new(480.0, 0.0)));
        let q = sensor_to_analysis(Point::new(640.0, 0.0), Rotation::Deg90, (640, 480));
        assert!(approx(q, Point::new(480.0, 640.0)));
    }

    #[test]
    fn mapper_swaps_analysis_dimensions() {
        let mapper = CoordinateMapper::new((256, 256), (640, 480), Rotation::Deg270);
        assert_eq!(mapper.analysis_size(), (480, 640));
        let mapper = CoordinateMapper::new((256, 256), (640, 480), Rotation::Deg180);
        assert_eq!(mapper.analysis_size(), (640, 480));
    }

    #[test]
    fn model_to_source_round_trips_and_keeps_identity() {
        let mapper = CoordinateMapper::new((256, 256), (640, 480), Rotation::Deg90);
        let quad = square(50.0, 60.0, 80.0);
        let source = mapper.model_to_source(&quad);
        let back = mapper.source_to_model(&source);
        for (a, b) in back.corners.iter().zip(quad.corners.iter()) {
            assert!(approx(*a, *b));
        }
        // Undoing a clockwise turn: sensor x = analysis y, sensor y = H - analysis x.
        let analysis_tl = mapper.model_to_analysis(&quad).top_left();
        assert!(approx(
            source.top_left(),
            Point::new(analysis_tl.y, 480.0 - analysis_tl.x)
        ));
    }
}
