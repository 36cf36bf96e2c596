// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-pixel foreground probabilities produced by the segmentation model.

use crate::error::{LabelscanError, Result};

/// Immutable `width x height` grid of foreground probabilities in `[0, 1]`,
/// stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityGrid {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl ProbabilityGrid {
    /// Wrap a row-major buffer. Values are clamped into `[0, 1]`; a buffer of
    /// the wrong length or containing NaN/infinity is rejected.
    pub fn new(width: u32, height: u32, mut data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(LabelscanError::InvalidGrid(format!(
                "grid dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(LabelscanError::InvalidGrid(format!(
                "expected {expected} values for {width}x{height}, got {}",
                data.len()
            )));
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(LabelscanError::InvalidGrid(format!(
                "non-finite value at index {index}"
            )));
        }
        for v in &mut data {
            *v = v.clamp(0.0, 1.0);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` at every cell.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Result<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.data.len()
    }

    /// Value at `(x, y)`. Panics if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// The row-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
