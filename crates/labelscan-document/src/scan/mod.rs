// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning: segmentation model seam, per-frame session, perspective
// correction and recognition prep.

pub mod enhance;
pub mod model;
pub mod perspective;
pub mod session;

pub use enhance::{PrepStyle, prepare_for_recognition};
pub use model::{LuminanceModel, SegmentationModel, StaticGridModel};
pub use perspective::{CorrectionResult, PerspectiveCorrector};
pub use session::{FrameDetection, ScanSession};
