// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization and morphological repair of the probability grid.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use labelscan_core::ProbabilityGrid;
use tracing::debug;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// `255` where `p >= threshold`, `0` elsewhere.
pub fn binarize(grid: &ProbabilityGrid, threshold: f32) -> GrayImage {
    GrayImage::from_fn(grid.width(), grid.height(), |x, y| {
        if grid.get(x, y) >= threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Binarize, then close and open with a `(2r + 1)` square element.
///
/// Closing runs first: broken document edges are the common failure, and
/// opening first would erase the thin bridges closing is meant to keep.
pub fn refine_mask(grid: &ProbabilityGrid, threshold: f32, radius: u8) -> GrayImage {
    let binary = binarize(grid, threshold);
    if radius == 0 {
        return binary;
    }
    let closed = close(&binary, Norm::LInf, radius);
    let refined = open(&closed, Norm::LInf, radius);
    debug!(
        threshold,
        foreground = foreground_count(&refined),
        "Mask refined"
    );
    refined
}

pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(width: u32, height: u32, on: impl Fn(u32, u32) -> bool) -> ProbabilityGrid {
        ProbabilityGrid::from_fn(width, height, |x, y| if on(x, y) { 0.9 } else { 0.02 })
            .expect("valid grid")
    }

    #[test]
    fn binarize_is_inclusive_at_threshold() {
        let grid = ProbabilityGrid::new(3, 1, vec![0.1, 0.2, 0.3]).expect("valid grid");
        let mask = binarize(&grid, 0.2);
        assert_eq!(mask.as_raw(), &vec![0, 255, 255]);
    }

    #[test]
    fn closing_bridges_a_one_pixel_gap() {
        // A filled block split by a one-pixel-wide vertical crack.
        let grid = grid_with(40, 40, |x, y| (10..30).contains(&x) && (10..30).contains(&y) && x != 20);
        let mask = refine_mask(&grid, 0.5, 1);
        assert_eq!(mask.get_pixel(20, 20).0[0], FOREGROUND);
    }

    #[test]
    fn opening_removes_isolated_speckles() {
        let grid = grid_with(40, 40, |x, y| {
            ((10..30).contains(&x) && (10..30).contains(&y)) || (x == 3 && y == 35)
        });
        let mask = refine_mask(&grid, 0.5, 1);
        assert_eq!(mask.get_pixel(3, 35).0[0], BACKGROUND);
        assert_eq!(mask.get_pixel(20, 20).0[0], FOREGROUND);
    }

    #[test]
    fn refinement_is_deterministic() {
        let grid = ProbabilityGrid::from_fn(64, 64, |x, y| ((x * 7 + y * 13) % 17) as f32 / 16.0)
            .expect("valid grid");
        let first = refine_mask(&grid, 0.4, 1);
        let second = refine_mask(&grid, 0.4, 1);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn empty_grid_gives_empty_mask() {
        let grid = ProbabilityGrid::new(32, 32, vec![0.0; 1024]).expect("valid grid");
        let mask = refine_mask(&grid, 0.05, 1);
        assert_eq!(foreground_count(&mask), 0);
    }
}
