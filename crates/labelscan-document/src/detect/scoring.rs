// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate scoring by shape, size plausibility and agreement with the
// probability grid.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;
use labelscan_core::{LabelCandidate, Point, ProbabilityGrid, Quadrilateral};
use tracing::{debug, instrument};

/// Interior angles further than this from 90 degrees score zero.
pub const ANGLE_TOLERANCE_DEG: f32 = 30.0;
/// Area ratios inside this band are fully plausible.
pub const AREA_BAND: (f32, f32) = (0.05, 0.6);

pub const RECTANGULARITY_WEIGHT: f32 = 0.5;
pub const AREA_WEIGHT: f32 = 0.3;
pub const PROBABILITY_WEIGHT: f32 = 0.2;

/// Scores and ranks candidates against one probability grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateScorer;

impl CandidateScorer {
    /// Fill in every scoring field and sort best first.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn score_all(
        &self,
        grid: &ProbabilityGrid,
        mut candidates: Vec<LabelCandidate>,
    ) -> Vec<LabelCandidate> {
        let grid_area = grid.area() as f32;
        for candidate in &mut candidates {
            candidate.rectangularity = rectangularity(&candidate.corners);
            candidate.area_ratio = candidate.area / grid_area;
            candidate.avg_probability = mean_inside(grid, &candidate.corners, None);
            candidate.score = RECTANGULARITY_WEIGHT * candidate.rectangularity
                + AREA_WEIGHT * area_score(candidate.area_ratio)
                + PROBABILITY_WEIGHT * candidate.avg_probability;
            debug!(
                rectangularity = candidate.rectangularity,
                area_ratio = candidate.area_ratio,
                avg_probability = candidate.avg_probability,
                score = candidate.score,
                "Candidate scored"
            );
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }
}

/// Mean of the angle score and the opposite-side score.
///
/// Angle score: per corner `1 - |angle - 90| / 30`, clamped to `[0, 1]`,
/// averaged. Side score: `min / max` of each opposite-side pair, averaged.
pub fn rectangularity(quad: &Quadrilateral) -> f32 {
    let c = &quad.corners;

    let mut angle_score = 0.0;
    for i in 0..4 {
        let angle = interior_angle(c[(i + 3) % 4], c[i], c[(i + 1) % 4]);
        angle_score += (1.0 - (angle - 90.0).abs() / ANGLE_TOLERANCE_DEG).clamp(0.0, 1.0);
    }
    angle_score /= 4.0;

    let top = c[0].distance(&c[1]);
    let right = c[1].distance(&c[2]);
    let bottom = c[2].distance(&c[3]);
    let left = c[3].distance(&c[0]);
    let side_score = (side_ratio(top, bottom) + side_ratio(left, right)) / 2.0;

    (angle_score + side_score) / 2.0
}

/// Angle at `vertex` between the edges to `prev` and `next`, in degrees.
fn interior_angle(prev: Point, vertex: Point, next: Point) -> f32 {
    let (ax, ay) = (prev.x - vertex.x, prev.y - vertex.y);
    let (bx, by) = (next.x - vertex.x, next.y - vertex.y);
    let norms = ax.hypot(ay) * bx.hypot(by);
    if norms <= f32::EPSILON {
        return 0.0;
    }
    ((ax * bx + ay * by) / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

fn side_ratio(a: f32, b: f32) -> f32 {
    let longest = a.max(b);
    if longest <= f32::EPSILON {
        0.0
    } else {
        a.min(b) / longest
    }
}

/// 1 inside [`AREA_BAND`], falling linearly to 0 at a ratio of 0 below the
/// band and at 1 above it.
pub fn area_score(ratio: f32) -> f32 {
    let (low, high) = AREA_BAND;
    if ratio < low {
        (ratio / low).max(0.0)
    } else if ratio > high {
        ((1.0 - ratio) / (1.0 - high)).max(0.0)
    } else {
        1.0
    }
}

/// Rasterize `quad` into a scratch mask the size of the grid. `None` if the
/// rounded corners collapse into fewer than three distinct pixels.
pub fn fill_mask(quad: &Quadrilateral, width: u32, height: u32) -> Option<GrayImage> {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for p in &quad.corners {
        let px = PixelPoint::new(p.x.round() as i32, p.y.round() as i32);
        if !poly.contains(&px) {
            poly.push(px);
        }
    }
    if poly.len() < 3 {
        return None;
    }
    let mut mask = GrayImage::new(width, height);
    draw_polygon_mut(&mut mask, &poly, Luma([255u8]));
    Some(mask)
}

/// Mean grid value over the pixels inside `quad`.
///
/// With `cutoff`, only pixels whose value is above it are averaged. Returns
/// 0 when no pixel qualifies.
pub fn mean_inside(grid: &ProbabilityGrid, quad: &Quadrilateral, cutoff: Option<f32>) -> f32 {
    let Some(mask) = fill_mask(quad, grid.width(), grid.height()) else {
        return 0.0;
    };

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for (value, pixel) in grid.as_slice().iter().zip(mask.pixels()) {
        if pixel.0[0] == 0 {
            continue;
        }
        if cutoff.is_some_and(|c| *value <= c) {
            continue;
        }
        sum += *value as f64;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}
