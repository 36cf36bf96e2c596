// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the label scanner.

use serde::{Deserialize, Serialize};

/// A 2-D point in whichever coordinate space the caller is working in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn as_tuple(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Four corner points.
///
/// Once produced by the corner orderer the corners are, by index,
/// top-left, top-right, bottom-right, bottom-left. Every coordinate mapping
/// keeps that identity, so index 0 is always the document's top-left even
/// after the points have been rotated into another space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub corners: [Point; 4],
}

impl Quadrilateral {
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Arithmetic mean of the four corners.
    pub fn centroid(&self) -> Point {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }

    /// Shoelace area, positive for TL, TR, BR, BL order in y-down image
    /// coordinates.
    pub fn signed_area(&self) -> f32 {
        let mut twice = 0.0f32;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            twice += a.x * b.y - b.x * a.y;
        }
        twice / 2.0
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// Smallest axis-aligned box containing all four corners.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in &self.corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Apply `f` to every corner, keeping corner identity.
    pub fn map(&self, f: impl FnMut(Point) -> Point) -> Self {
        Self {
            corners: self.corners.map(f),
        }
    }

    pub fn to_tuples(&self) -> [(f32, f32); 4] {
        self.corners.map(|p| p.as_tuple())
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Summary statistics of a probability grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbMapStats {
    pub mean: f32,
    pub std_dev: f32,
    pub median: f32,
    pub min: f32,
    pub max: f32,
}

/// Whether a detection runs on the live preview or on a final capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Interactive preview: favours recall and responsiveness.
    Live,
    /// Final high-quality pass before correction.
    Final,
}

/// Clockwise rotation from the sensor image to the upright analysis image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a multiple of 90 degrees. Negative values and values of 360 and
    /// above are normalised.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when width and height trade places under this rotation.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// A provisional four-corner region and its scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelCandidate {
    pub corners: Quadrilateral,
    /// Enclosed contour area in grid units squared.
    pub area: f32,
    pub rectangularity: f32,
    pub area_ratio: f32,
    pub avg_probability: f32,
    /// Composite ranking score. Not the same as the reported confidence.
    pub score: f32,
}

impl LabelCandidate {
    /// A candidate with geometry only; scoring fills in the rest.
    pub fn unscored(corners: Quadrilateral, area: f32) -> Self {
        Self {
            corners,
            area,
            ..Self::default()
        }
    }
}

/// Outcome of one detection call.
///
/// When `detected` is false every other field holds its default; check it
/// before reading any geometry. Only `original_corner_points` may be used
/// for cropping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected: bool,
    /// Display corners, grown outward from the centroid, in model space.
    pub corner_points: Quadrilateral,
    /// True-edge corners in model space.
    pub original_corner_points: Quadrilateral,
    /// Bounds of the display corners.
    pub bounding_box: BoundingBox,
    /// Mean grid value over confidently-foreground pixels inside the region.
    pub confidence: f32,
    /// Direction of the top edge in degrees.
    pub rotation_angle: f32,
    pub model_width: u32,
    pub model_height: u32,
}

impl DetectionResult {
    pub fn not_detected() -> Self {
        Self::default()
    }

    /// Build a positive result; the bounding box and angle are derived from
    /// the corners.
    pub fn found(
        expanded: Quadrilateral,
        original: Quadrilateral,
        confidence: f32,
        model_width: u32,
        model_height: u32,
    ) -> Self {
        let tl = original.top_left();
        let tr = original.top_right();
        let rotation_angle = (tr.y - tl.y).atan2(tr.x - tl.x).to_degrees();
        Self {
            detected: true,
            corner_points: expanded,
            original_corner_points: original,
            bounding_box: expanded.bounding_box(),
            confidence,
            rotation_angle,
            model_width,
            model_height,
        }
    }

    /// The display corners, if anything was detected.
    pub fn display_corners(&self) -> Option<&Quadrilateral> {
        self.detected.then_some(&self.corner_points)
    }

    /// The cropping corners, if anything was detected.
    pub fn crop_corners(&self) -> Option<&Quadrilateral> {
        self.detected.then_some(&self.original_corner_points)
    }
}

/// Why a frame produced no detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MissReason {
    /// No usable candidate survived extraction.
    NoForeground,
    /// The best candidate scored below the acceptance threshold.
    LowConfidence { best_score: f32, required: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(side: f32) -> Quadrilateral {
        Quadrilateral::new([
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ])
    }

    #[test]
    fn canonical_order_has_positive_area() {
        let quad = unit_square(10.0);
        assert!((quad.signed_area() - 100.0).abs() < 1e-4);

        let reversed = Quadrilateral::new([
            quad.corners[0],
            quad.corners[3],
            quad.corners[2],
            quad.corners[1],
        ]);
        assert!(reversed.signed_area() < 0.0);
        assert!((reversed.area() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn centroid_and_bounds() {
        let quad = unit_square(8.0);
        assert_eq!(quad.centroid(), Point::new(4.0, 4.0));
        let bb = quad.bounding_box();
        assert_eq!((bb.x, bb.y, bb.width, bb.height), (0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn rotation_parsing_normalises() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
        assert!(Rotation::Deg270.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
    }

    #[test]
    fn not_detected_is_all_defaults() {
        let result = DetectionResult::not_detected();
        assert!(!result.detected);
        assert!(result.crop_corners().is_none());
        assert!(result.display_corners().is_none());
        assert_eq!(result.corner_points, Quadrilateral::default());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn found_derives_angle_and_bounds() {
        let original = Quadrilateral::new([
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(10.0, 30.0),
            Point::new(0.0, 20.0),
        ]);
        let result = DetectionResult::found(original, original, 0.8, 64, 64);
        assert!(result.detected);
        assert!((result.rotation_angle - 45.0).abs() < 1e-4);
        assert_eq!(result.bounding_box.width, 20.0);
        assert_eq!(result.crop_corners(), Some(&original));
    }
}
