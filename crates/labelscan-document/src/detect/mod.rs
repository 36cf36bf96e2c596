// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label detection on a segmentation probability grid: statistics, adaptive
// threshold, mask repair, contour candidates and scoring.

pub mod candidates;
pub mod mask;
pub mod pipeline;
pub mod scoring;
pub mod stats;
pub mod threshold;

pub use candidates::CandidateExtractor;
pub use mask::refine_mask;
pub use pipeline::{FrameAnalysis, LabelDetector};
pub use scoring::CandidateScorer;
pub use stats::compute_stats;
pub use threshold::select_threshold;
