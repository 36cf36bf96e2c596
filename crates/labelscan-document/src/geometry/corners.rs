// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical corner ordering.

use labelscan_core::{Point, Quadrilateral};

/// Put four points into `[top_left, top_right, bottom_right, bottom_left]`
/// order, whatever order they arrive in.
///
/// The smallest `x + y` is the top-left and the largest is the bottom-right.
/// The other two are split by which side of the TL→BR diagonal they fall on:
/// a negative cross product means top-right. Assumes a convex, non-degenerate
/// quadrilateral; if both points land on the same side, the one with the
/// smaller cross product is taken as top-right.
pub fn order_corners(points: [Point; 4]) -> Quadrilateral {
    let sum = |p: &Point| p.x + p.y;

    let mut tl = 0;
    for i in 1..4 {
        if sum(&points[i]) < sum(&points[tl]) {
            tl = i;
        }
    }

    let mut br = if tl == 0 { 1 } else { 0 };
    for i in 0..4 {
        if i != tl && sum(&points[i]) > sum(&points[br]) {
            br = i;
        }
    }

    // tl != br, so exactly two indices remain.
    let mut rest = [0usize; 2];
    let mut filled = 0;
    for i in 0..4 {
        if i != tl && i != br {
            rest[filled] = i;
            filled += 1;
        }
    }
    let [a, b] = rest;

    let top_left = points[tl];
    let bottom_right = points[br];
    let cross = |p: &Point| {
        (bottom_right.x - top_left.x) * (p.y - top_left.y)
            - (bottom_right.y - top_left.y) * (p.x - top_left.x)
    };

    let (top_right, bottom_left) = if cross(&points[a]) <= cross(&points[b]) {
        (points[a], points[b])
    } else {
        (points[b], points[a])
    };

    Quadrilateral::new([top_left, top_right, bottom_right, bottom_left])
}
