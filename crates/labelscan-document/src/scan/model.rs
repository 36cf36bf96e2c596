// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Segmentation model abstraction.
//
// Inference itself lives outside this crate; a model only has to turn a frame
// of its input size into a probability grid of the same size.

use image::{DynamicImage, GrayImage};
use labelscan_core::ProbabilityGrid;
use labelscan_core::error::{LabelscanError, Result};
use tracing::debug;

/// Produces a per-pixel label probability for a frame.
pub trait SegmentationModel {
    /// `(width, height)` the model expects and returns.
    fn input_size(&self) -> (u32, u32);

    /// Segment a frame already resized to [`input_size`](Self::input_size).
    fn segment(&self, frame: &DynamicImage) -> Result<ProbabilityGrid>;
}

/// Scale 8-bit luma to probabilities (`0 -> 0.0`, `255 -> 1.0`).
pub fn grid_from_luma(luma: &GrayImage) -> Result<ProbabilityGrid> {
    let data = luma.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
    ProbabilityGrid::new(luma.width(), luma.height(), data)
}

fn check_input(model: &impl SegmentationModel, frame: &DynamicImage) -> Result<()> {
    let expected = model.input_size();
    let actual = (frame.width(), frame.height());
    if actual != expected {
        return Err(LabelscanError::Segmentation(format!(
            "model expects {}x{} input, got {}x{}",
            expected.0, expected.1, actual.0, actual.1
        )));
    }
    Ok(())
}

/// Replays a precomputed grid for every frame.
///
/// Used when the grid comes from an external inference run (e.g. a saved
/// probability map) and in tests.
#[derive(Debug, Clone)]
pub struct StaticGridModel {
    grid: ProbabilityGrid,
}

impl StaticGridModel {
    pub fn new(grid: ProbabilityGrid) -> Self {
        Self { grid }
    }

    pub fn from_luma(luma: &GrayImage) -> Result<Self> {
        grid_from_luma(luma).map(Self::new)
    }

    pub fn grid(&self) -> &ProbabilityGrid {
        &self.grid
    }
}

impl SegmentationModel for StaticGridModel {
    fn input_size(&self) -> (u32, u32) {
        (self.grid.width(), self.grid.height())
    }

    fn segment(&self, frame: &DynamicImage) -> Result<ProbabilityGrid> {
        check_input(self, frame)?;
        Ok(self.grid.clone())
    }
}

/// Treats brightness as label probability.
///
/// A stand-in for a trained network when labels are light on a dark
/// background (or the reverse, with `invert`).
#[derive(Debug, Clone, Copy)]
pub struct LuminanceModel {
    width: u32,
    height: u32,
    invert: bool,
}

impl LuminanceModel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            invert: false,
        }
    }

    /// Dark pixels become likely foreground.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

impl SegmentationModel for LuminanceModel {
    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn segment(&self, frame: &DynamicImage) -> Result<ProbabilityGrid> {
        check_input(self, frame)?;
        let mut luma = frame.to_luma8();
        if self.invert {
            image::imageops::invert(&mut luma);
        }
        debug!(invert = self.invert, "Luminance segmentation");
        grid_from_luma(&luma)
    }
}
