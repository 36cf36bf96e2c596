// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate extraction: external contours of the refined mask, filtered by
// area and simplified to four-vertex polygons.

use image::GrayImage;
use image::imageops::replace;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point as PixelPoint;
use labelscan_core::{DetectorConfig, LabelCandidate, Point, Quadrilateral};
use tracing::{debug, instrument};

use crate::geometry::order_corners;

/// Why a simplified contour was not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Two corners closer than the configured minimum distance.
    CloseVertices,
    /// Zero or negative area once the corners are in canonical order.
    NonPositiveArea,
}

/// Turns a binary mask into unscored four-corner candidates.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    min_area_fraction: f64,
    max_area_fraction: f64,
    tolerances: Vec<f64>,
    min_corner_distance: f32,
}

impl CandidateExtractor {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_area_fraction: config.min_area_fraction,
            max_area_fraction: config.max_area_fraction,
            tolerances: config.simplify_tolerances.clone(),
            min_corner_distance: config.min_corner_distance,
        }
    }

    /// Extract candidates from `mask`. An empty list is a normal outcome.
    ///
    /// On a binary mask the edge pixels are exactly the region borders, so
    /// outer borders are traced on the mask itself and only top-level ones
    /// (no enclosing border) are kept. Regions touching the grid edge are
    /// traced like any other.
    #[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
    pub fn extract(&self, mask: &GrayImage) -> Vec<LabelCandidate> {
        let total = mask.width() as f64 * mask.height() as f64;
        let min_area = total * self.min_area_fraction;
        let max_area = total * self.max_area_fraction;

        let contours = find_contours::<i32>(&with_empty_border(mask));
        let mut candidates = Vec::new();

        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            if contour.points.len() < 4 {
                continue;
            }
            // Back from the bordered image to mask coordinates.
            let points: Vec<PixelPoint<i32>> = contour
                .points
                .iter()
                .map(|p| PixelPoint::new(p.x - 1, p.y - 1))
                .collect();

            let area = polygon_area(&points);
            if area < min_area || area > max_area {
                debug!(area, min_area, max_area, "Contour outside area band");
                continue;
            }

            let Some(vertices) = self.simplify_to_quad(&points) else {
                debug!(points = points.len(), "Contour did not simplify to a quad");
                continue;
            };

            let corners = order_corners(vertices);
            if let Some(reason) = self.degeneracy(&corners) {
                debug!(?reason, ?corners, "Dropping degenerate candidate");
                continue;
            }

            candidates.push(LabelCandidate::unscored(corners, area as f32));
        }

        debug!(
            contours = contours.len(),
            candidates = candidates.len(),
            "Candidate extraction complete"
        );
        candidates
    }

    /// Try each tolerance in turn until one gives exactly four vertices.
    /// Otherwise fall back to the result with the fewest vertices above four,
    /// reduced to four.
    fn simplify_to_quad(&self, contour: &[PixelPoint<i32>]) -> Option<[Point; 4]> {
        let perimeter = arc_length(contour, true);
        if perimeter <= 0.0 {
            return None;
        }

        let mut fallback: Option<Vec<PixelPoint<i32>>> = None;
        for &tolerance in &self.tolerances {
            let approx = simplify_closed(contour, tolerance * perimeter);
            if approx.len() == 4 {
                return Some([0, 1, 2, 3].map(|i| to_point(approx[i])));
            }
            if approx.len() > 4 && fallback.as_ref().is_none_or(|f| approx.len() < f.len()) {
                fallback = Some(approx);
            }
        }

        fallback.map(|vertices| reduce_to_four(vertices.into_iter().map(to_point).collect()))
    }

    /// Check an ordered quadrilateral against the rejection rules.
    pub fn degeneracy(&self, quad: &Quadrilateral) -> Option<Degeneracy> {
        for i in 0..4 {
            for j in (i + 1)..4 {
                if quad.corners[i].distance(&quad.corners[j]) < self.min_corner_distance {
                    return Some(Degeneracy::CloseVertices);
                }
            }
        }
        if quad.signed_area() <= 0.0 {
            return Some(Degeneracy::NonPositiveArea);
        }
        None
    }
}

/// Copy of `mask` inside a one-pixel background frame.
///
/// The border follower only reports a region as an outer border when
/// background surrounds it, so foreground on the first row or column would
/// otherwise come back as a hole.
fn with_empty_border(mask: &GrayImage) -> GrayImage {
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    replace(&mut framed, mask, 1, 1);
    framed
}

fn to_point(p: PixelPoint<i32>) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

/// Absolute shoelace area of a closed pixel polygon.
pub fn polygon_area(points: &[PixelPoint<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    twice.abs() as f64 / 2.0
}

/// Douglas–Peucker on a closed contour.
///
/// The contour is cut at its two mutually farthest points and each chain is
/// simplified as an open curve, so the arbitrary first point of the trace is
/// not forced to stay a vertex.
pub fn simplify_closed(contour: &[PixelPoint<i32>], epsilon: f64) -> Vec<PixelPoint<i32>> {
    if contour.len() < 4 || epsilon <= 0.0 {
        return contour.to_vec();
    }

    let a = farthest_from(contour, contour[0]);
    let b = farthest_from(contour, contour[a]);
    let (lo, hi) = (a.min(b), a.max(b));
    if lo == hi {
        return contour.to_vec();
    }

    let forward = &contour[lo..=hi];
    let backward: Vec<_> = contour[hi..]
        .iter()
        .chain(contour[..=lo].iter())
        .copied()
        .collect();

    let mut simplified = approximate_polygon_dp(forward, epsilon, false);
    let mut back = approximate_polygon_dp(&backward, epsilon, false);
    // Each chain ends where the other starts.
    simplified.pop();
    back.pop();
    simplified.extend(back);
    simplified
}

fn farthest_from(points: &[PixelPoint<i32>], origin: PixelPoint<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Drop the vertex spanning the smallest triangle with its neighbours until
/// four remain. Expects at least four vertices.
pub fn reduce_to_four(mut vertices: Vec<Point>) -> [Point; 4] {
    while vertices.len() > 4 {
        let n = vertices.len();
        let mut weakest = 0;
        let mut weakest_area = f32::INFINITY;
        for i in 0..n {
            let prev = vertices[(i + n - 1) % n];
            let cur = vertices[i];
            let next = vertices[(i + 1) % n];
            let area = ((cur.x - prev.x) * (next.y - prev.y) - (next.x - prev.x) * (cur.y - prev.y))
                .abs()
                / 2.0;
            if area < weakest_area {
                weakest = i;
                weakest_area = area;
            }
        }
        vertices.remove(weakest);
    }
    [vertices[0], vertices[1], vertices[2], vertices[3]]
}
