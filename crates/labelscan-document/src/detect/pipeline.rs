// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary-extraction pipeline: probability grid in, detection result out.

use labelscan_core::error::{LabelscanError, Result};
use labelscan_core::{
    DetectionMode, DetectionResult, DetectorConfig, LabelCandidate, MissReason, ProbMapStats,
    ProbabilityGrid,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::candidates::CandidateExtractor;
use super::mask::refine_mask;
use super::scoring::{CandidateScorer, mean_inside};
use super::stats::compute_stats;
use super::threshold::select_threshold;
use crate::geometry::mapping::expand_from_centroid;

/// Everything one detection call learned about a grid.
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    pub result: DetectionResult,
    pub stats: ProbMapStats,
    pub threshold: f32,
    /// Candidates that survived extraction and were scored.
    pub candidates_scored: usize,
    /// The winning candidate, accepted or not.
    pub best: Option<LabelCandidate>,
    pub miss: Option<MissReason>,
}

/// Finds the single best label quadrilateral in a probability grid.
///
/// Holds no per-frame state: every call allocates its own mask and scratch
/// buffers and drops them before returning.
///
/// ```ignore
/// let detector = LabelDetector::new(DetectorConfig::default())?;
/// let result = detector.detect(&grid, DetectionMode::Live)?;
/// if let Some(corners) = result.crop_corners() {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LabelDetector {
    config: DetectorConfig,
    extractor: CandidateExtractor,
    scorer: CandidateScorer,
}

impl LabelDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let extractor = CandidateExtractor::new(&config);
        Ok(Self {
            config,
            extractor,
            scorer: CandidateScorer,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect and return only the result.
    pub fn detect(&self, grid: &ProbabilityGrid, mode: DetectionMode) -> Result<DetectionResult> {
        self.analyze(grid, mode).map(|analysis| analysis.result)
    }

    /// Run every stage and keep the intermediate values.
    ///
    /// Fails only if the grid does not match the configured model size. No
    /// label, or no trustworthy label, is `Ok` with `detected == false`.
    #[instrument(skip_all, fields(?mode))]
    pub fn analyze(&self, grid: &ProbabilityGrid, mode: DetectionMode) -> Result<FrameAnalysis> {
        self.check_shape(grid)?;

        let stats = compute_stats(grid);
        let threshold = select_threshold(&stats, mode, self.config.live_threshold_cap);
        debug!(
            mean = stats.mean,
            std_dev = stats.std_dev,
            median = stats.median,
            threshold,
            "Threshold selected"
        );

        let candidates = {
            let mask = refine_mask(grid, threshold, self.config.morph_radius);
            self.extractor.extract(&mask)
        };

        let miss = |reason: MissReason, scored: usize, best: Option<LabelCandidate>| {
            debug!(?reason, "No label detected");
            FrameAnalysis {
                result: DetectionResult::not_detected(),
                stats,
                threshold,
                candidates_scored: scored,
                best,
                miss: Some(reason),
            }
        };

        if candidates.is_empty() {
            return Ok(miss(MissReason::NoForeground, 0, None));
        }

        let ranked = self.scorer.score_all(grid, candidates);
        let scored = ranked.len();
        let Some(best) = ranked.into_iter().next() else {
            return Ok(miss(MissReason::NoForeground, 0, None));
        };

        let required = self.min_score(mode);
        if best.score < required {
            return Ok(miss(
                MissReason::LowConfidence {
                    best_score: best.score,
                    required,
                },
                scored,
                Some(best),
            ));
        }

        let original = best.corners;
        let expanded = expand_from_centroid(
            &original,
            self.config.expand_ratio,
            grid.width() as f32,
            grid.height() as f32,
        );
        let confidence = mean_inside(grid, &original, Some(self.config.confidence_cutoff));
        let result =
            DetectionResult::found(expanded, original, confidence, grid.width(), grid.height());

        info!(
            score = best.score,
            confidence,
            rotation_angle = result.rotation_angle,
            "Label detected"
        );

        Ok(FrameAnalysis {
            result,
            stats,
            threshold,
            candidates_scored: scored,
            best: Some(best),
            miss: None,
        })
    }

    /// Acceptance threshold on the composite score.
    pub fn min_score(&self, mode: DetectionMode) -> f32 {
        match mode {
            DetectionMode::Live => self.config.live_min_score,
            DetectionMode::Final => self.config.final_min_score,
        }
    }

    fn check_shape(&self, grid: &ProbabilityGrid) -> Result<()> {
        if grid.width() != self.config.model_width || grid.height() != self.config.model_height {
            return Err(LabelscanError::GridShapeMismatch {
                expected_width: self.config.model_width,
                expected_height: self.config.model_height,
                actual_width: grid.width(),
                actual_height: grid.height(),
            });
        }
        Ok(())
    }
}
