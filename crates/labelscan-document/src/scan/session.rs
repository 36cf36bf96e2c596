// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session: runs the segmentation model on camera frames, detects the
// label, and rectifies it from the full-resolution frame on confirmation.

use image::DynamicImage;
use labelscan_core::error::{LabelscanError, Result};
use labelscan_core::{DetectionMode, DetectionResult, Quadrilateral, Rotation, ScanConfig};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::model::SegmentationModel;
use super::perspective::{CorrectionResult, PerspectiveCorrector};
use crate::detect::{FrameAnalysis, LabelDetector};
use crate::geometry::CoordinateMapper;
use crate::image::FrameProcessor;

/// Detection for one sensor frame, with its corners in every space a caller
/// needs.
#[derive(Debug, Clone, Serialize)]
pub struct FrameDetection {
    pub analysis: FrameAnalysis,
    pub rotation: Rotation,
    pub sensor_width: u32,
    pub sensor_height: u32,
    /// Expanded corners in the upright analysis frame, for overlays.
    pub display_corners: Option<Quadrilateral>,
    /// True-edge corners in the sensor image, for correction.
    pub crop_corners: Option<Quadrilateral>,
}

impl FrameDetection {
    fn new(analysis: FrameAnalysis, mapper: &CoordinateMapper) -> Self {
        let result = &analysis.result;
        let display_corners = result
            .display_corners()
            .map(|quad| mapper.model_to_analysis(quad));
        let crop_corners = result
            .crop_corners()
            .map(|quad| mapper.model_to_source(quad));
        let (sensor_width, sensor_height) = mapper.sensor_size();
        Self {
            rotation: mapper.rotation(),
            sensor_width,
            sensor_height,
            display_corners,
            crop_corners,
            analysis,
        }
    }

    pub fn result(&self) -> &DetectionResult {
        &self.analysis.result
    }

    pub fn detected(&self) -> bool {
        self.analysis.result.detected
    }
}

/// Model, detector and corrector for one scanning session.
pub struct ScanSession<M> {
    model: M,
    detector: LabelDetector,
    corrector: PerspectiveCorrector,
}

impl<M: SegmentationModel> ScanSession<M> {
    /// Fails if the configuration is invalid or the model's input size
    /// differs from the configured grid size.
    pub fn new(model: M, config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        let expected = (config.detector.model_width, config.detector.model_height);
        let actual = model.input_size();
        if actual != expected {
            return Err(LabelscanError::InvalidConfig(format!(
                "model input is {}x{} but the detector expects {}x{}",
                actual.0, actual.1, expected.0, expected.1
            )));
        }
        Ok(Self {
            model,
            detector: LabelDetector::new(config.detector.clone())?,
            corrector: PerspectiveCorrector::new(&config.correction),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn detector(&self) -> &LabelDetector {
        &self.detector
    }

    /// Segment and analyse one sensor frame.
    ///
    /// `rotation` is the clockwise turn that makes the sensor frame upright.
    #[instrument(skip(self, sensor_frame), fields(width = sensor_frame.width(), height = sensor_frame.height()))]
    pub fn process_frame(
        &self,
        sensor_frame: &DynamicImage,
        rotation: Rotation,
        mode: DetectionMode,
    ) -> Result<FrameDetection> {
        let model_size = self.model.input_size();
        let sensor_size = (sensor_frame.width(), sensor_frame.height());
        let mapper = CoordinateMapper::new(model_size, sensor_size, rotation);

        // Downscale before rotating; the frame is much larger than the model.
        let pre_rotation = if rotation.swaps_dimensions() {
            (model_size.1, model_size.0)
        } else {
            model_size
        };
        let input = FrameProcessor::from_dynamic(sensor_frame.clone())
            .to_model_input(pre_rotation.0, pre_rotation.1)
            .orient(rotation);

        let grid = self.model.segment(input.as_dynamic())?;
        let analysis = self.detector.analyze(&grid, mode)?;
        debug!(detected = analysis.result.detected, "Frame processed");
        Ok(FrameDetection::new(analysis, &mapper))
    }

    /// Rectify the detected label from the sensor frame it was found in.
    ///
    /// `None` when nothing was detected, the frame does not match the one the
    /// detection came from, or the warp is impossible.
    #[instrument(skip_all)]
    pub fn confirm(
        &self,
        sensor_frame: &DynamicImage,
        detection: &FrameDetection,
    ) -> Option<CorrectionResult> {
        let quad = detection.crop_corners?;
        let frame_size = (sensor_frame.width(), sensor_frame.height());
        if frame_size != (detection.sensor_width, detection.sensor_height) {
            warn!(
                ?frame_size,
                expected_width = detection.sensor_width,
                expected_height = detection.sensor_height,
                "Frame does not match the detection; not correcting"
            );
            return None;
        }
        let corrected = self.corrector.correct(sensor_frame, &quad)?;
        info!(
            width = corrected.width,
            height = corrected.height,
            "Label confirmed"
        );
        Some(corrected)
    }
}
