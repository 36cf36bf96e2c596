// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labelscan-document: label boundary extraction from segmentation probability
// grids, and perspective correction of the detected label.
//
// The detector turns a `ProbabilityGrid` into a `DetectionResult`; the
// corrector turns an image plus the detected corners into a rectified crop.
// `ScanSession` wires both to a segmentation model for camera frames.

pub mod detect;
pub mod geometry;
pub mod image;
pub mod scan;

pub use detect::{FrameAnalysis, LabelDetector};
pub use geometry::CoordinateMapper;
pub use crate::image::processor::FrameProcessor;
pub use scan::perspective::{CorrectionResult, PerspectiveCorrector};
pub use scan::session::{FrameDetection, ScanSession};
