// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summary statistics of a probability grid.

use labelscan_core::{ProbMapStats, ProbabilityGrid};

/// Mean, population standard deviation, median, min and max of the grid.
///
/// One pass for mean/min/max, a second for the deviation, and a selection
/// for the median (the upper middle element when the count is even).
pub fn compute_stats(grid: &ProbabilityGrid) -> ProbMapStats {
    let values = grid.as_slice();
    if values.is_empty() {
        return ProbMapStats::default();
    }
    let n = values.len() as f64;

    let mut sum = 0.0f64;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values {
        sum += v as f64;
        min = min.min(v);
        max = max.max(v);
    }
    let mean = sum / n;

    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    // Scratch copy for the selection; dropped on return.
    let mut scratch = values.to_vec();
    let mid = scratch.len() / 2;
    let (_, median, _) = scratch.select_nth_unstable_by(mid, f32::total_cmp);

    ProbMapStats {
        mean: mean as f32,
        std_dev: variance.sqrt() as f32,
        median: *median,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_grid() {
        let grid = ProbabilityGrid::new(16, 16, vec![0.0; 256]).expect("valid grid");
        let stats = compute_stats(&grid);
        assert_eq!(stats, ProbMapStats::default());
    }

    #[test]
    fn known_values() {
        let grid = ProbabilityGrid::new(2, 2, vec![0.1, 0.9, 0.3, 0.5]).expect("valid grid");
        let stats = compute_stats(&grid);
        assert!((stats.mean - 0.45).abs() < 1e-6);
        // Population deviation of {0.1, 0.3, 0.5, 0.9}.
        assert!((stats.std_dev - 0.295_804).abs() < 1e-5);
        assert!((stats.median - 0.5).abs() < 1e-6);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.9);
    }

    #[test]
    fn odd_count_median_is_middle() {
        let grid = ProbabilityGrid::new(5, 1, vec![0.7, 0.2, 0.4, 1.0, 0.0]).expect("valid grid");
        assert!((compute_stats(&grid).median - 0.4).abs() < 1e-6);
    }

    #[test]
    fn sparse_grid_has_zero_median() {
        let grid = ProbabilityGrid::from_fn(10, 10, |x, y| if x < 2 && y < 2 { 1.0 } else { 0.0 })
            .expect("valid grid");
        let stats = compute_stats(&grid);
        assert_eq!(stats.median, 0.0);
        assert!((stats.mean - 0.04).abs() < 1e-6);
    }
}
