// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarization threshold.
//
// The grid is usually bimodal but sparse, and where the two modes sit moves
// with scene lighting, so the cut-off follows the grid's own statistics.

use labelscan_core::{DetectionMode, ProbMapStats};

/// Median below which the grid is treated as near-empty.
pub const SPARSE_MEDIAN: f32 = 0.01;
/// Floor of the threshold for near-empty grids.
pub const SPARSE_FLOOR: f32 = 0.05;
/// Fraction of the mean used for near-empty grids.
pub const SPARSE_MEAN_SCALE: f32 = 0.8;
/// Weight of the standard deviation above the mean.
pub const STD_DEV_WEIGHT: f32 = 0.5;
pub const MIN_THRESHOLD: f32 = 0.08;
pub const MAX_THRESHOLD: f32 = 0.25;

/// Pick the binarization threshold for one grid.
///
/// - near-empty (`median < 0.01`): `max(0.05, 0.8 * mean)`
/// - otherwise: `mean + 0.5 * std_dev`, clamped to `[0.08, 0.25]`
/// - live mode caps either result at `live_cap`
pub fn select_threshold(stats: &ProbMapStats, mode: DetectionMode, live_cap: f32) -> f32 {
    let threshold = if stats.median < SPARSE_MEDIAN {
        SPARSE_FLOOR.max(stats.mean * SPARSE_MEAN_SCALE)
    } else {
        (stats.mean + STD_DEV_WEIGHT * stats.std_dev).clamp(MIN_THRESHOLD, MAX_THRESHOLD)
    };

    match mode {
        DetectionMode::Live => threshold.min(live_cap),
        DetectionMode::Final => threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE_CAP: f32 = 0.15;

    fn stats(mean: f32, std_dev: f32, median: f32) -> ProbMapStats {
        ProbMapStats {
            mean,
            std_dev,
            median,
            min: 0.0,
            max: 1.0,
        }
    }

    #[test]
    fn sparse_grid_uses_scaled_mean_with_floor() {
        let t = select_threshold(&stats(0.02, 0.1, 0.0), DetectionMode::Final, LIVE_CAP);
        assert!((t - 0.05).abs() < 1e-6);
        let t = select_threshold(&stats(0.3, 0.1, 0.005), DetectionMode::Final, LIVE_CAP);
        assert!((t - 0.24).abs() < 1e-6);
    }

    #[test]
    fn dense_grid_tracks_mean_and_deviation() {
        let t = select_threshold(&stats(0.1, 0.1, 0.2), DetectionMode::Final, LIVE_CAP);
        assert!((t - 0.15).abs() < 1e-6);
    }

    #[test]
    fn dense_grid_is_clamped() {
        let low = select_threshold(&stats(0.02, 0.02, 0.05), DetectionMode::Final, LIVE_CAP);
        assert_eq!(low, MIN_THRESHOLD);
        let high = select_threshold(&stats(0.6, 0.3, 0.7), DetectionMode::Final, LIVE_CAP);
        assert_eq!(high, MAX_THRESHOLD);
    }

    #[test]
    fn live_mode_caps_the_threshold() {
        let t = select_threshold(&stats(0.6, 0.3, 0.7), DetectionMode::Live, LIVE_CAP);
        assert_eq!(t, LIVE_CAP);
        let t = select_threshold(&stats(0.3, 0.1, 0.0), DetectionMode::Live, LIVE_CAP);
        assert_eq!(t, LIVE_CAP);
    }

    #[test]
    fn dense_threshold_is_monotonic_in_mean_and_bounded() {
        for mode in [DetectionMode::Live, DetectionMode::Final] {
            let mut previous = f32::NEG_INFINITY;
            for step in 0..=100 {
                let mean = step as f32 / 100.0;
                let t = select_threshold(&stats(mean, 0.07, 0.3), mode, LIVE_CAP);
                assert!(t >= previous, "threshold dropped at mean {mean}");
                assert!((MIN_THRESHOLD..=MAX_THRESHOLD).contains(&t));
                if mode == DetectionMode::Live {
                    assert!(t <= LIVE_CAP);
                }
                previous = t;
            }
        }
    }
}
