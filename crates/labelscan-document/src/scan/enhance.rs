// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preparation of a corrected label crop for text or barcode recognition.
//
// Every operation allocates its own summed-area tables and buffers; nothing
// is cached between calls.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{equalize_histogram, otsu_level};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How to prepare a crop for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepStyle {
    /// Luma only.
    Grayscale,
    /// Global histogram equalisation.
    Equalize,
    /// Each pixel normalised against its neighbourhood's mean and spread.
    LocalContrast { radius: u32 },
    /// Black where darker than the local mean minus `c`.
    Adaptive { block_radius: u32, c: i32 },
    /// Single global threshold chosen by Otsu's method.
    Otsu,
}

impl Default for PrepStyle {
    fn default() -> Self {
        Self::Adaptive {
            block_radius: 15,
            c: 10,
        }
    }
}

/// Run one preparation style on a corrected crop.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn prepare_for_recognition(image: &DynamicImage, style: PrepStyle) -> GrayImage {
    let prep = RecognitionPrep::from_dynamic(image);
    match style {
        PrepStyle::Grayscale => prep,
        PrepStyle::Equalize => prep.equalize(),
        PrepStyle::LocalContrast { radius } => prep.local_contrast(radius),
        PrepStyle::Adaptive { block_radius, c } => prep.binarize(block_radius, c),
        PrepStyle::Otsu => prep.binarize_otsu(),
    }
    .into_luma()
}

/// A grayscale crop being prepared. Each step consumes `self`.
pub struct RecognitionPrep {
    luma: GrayImage,
}

impl RecognitionPrep {
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            luma: image.to_luma8(),
        }
    }

    pub fn from_luma(luma: GrayImage) -> Self {
        Self { luma }
    }

    pub fn as_luma(&self) -> &GrayImage {
        &self.luma
    }

    pub fn into_luma(self) -> GrayImage {
        self.luma
    }

    pub fn equalize(self) -> Self {
        Self {
            luma: equalize_histogram(&self.luma),
        }
    }

    /// Map each pixel to `128 + 64 * (p - mean) / std` over a
    /// `(2 * radius + 1)` window.
    ///
    /// Evens out uneven lighting across the crop without a global stretch.
    pub fn local_contrast(self, radius: u32) -> Self {
        let (width, height) = self.luma.dimensions();
        let table = SummedArea::new(&self.luma);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let (mean, variance) = table.window_stats(x, y, radius);
            let std_dev = variance.max(0.0).sqrt().max(1.0);
            let value = self.luma.get_pixel(x, y).0[0] as f64;
            let normalised = 128.0 + 64.0 * (value - mean) / std_dev;
            Luma([normalised.round().clamp(0.0, 255.0) as u8])
        });
        debug!(radius, "Local contrast normalised");
        Self { luma: output }
    }

    /// Adaptive threshold: a pixel is black when darker than the mean of its
    /// `block_radius` neighbourhood minus `c`, white otherwise.
    ///
    /// Typical values are 15 and 10.
    pub fn binarize(self, block_radius: u32, c: i32) -> Self {
        let (width, height) = self.luma.dimensions();
        let table = SummedArea::new(&self.luma);

        let output = GrayImage::from_fn(width, height, |x, y| {
            let (mean, _) = table.window_stats(x, y, block_radius);
            let threshold = (mean as i32 - c).clamp(0, 255) as u8;
            let value = self.luma.get_pixel(x, y).0[0];
            Luma([if value < threshold { 0 } else { 255 }])
        });
        debug!(block_radius, c, "Adaptive binarization complete");
        Self { luma: output }
    }

    pub fn binarize_otsu(self) -> Self {
        let level = otsu_level(&self.luma);
        debug!(level, "Otsu level computed");
        let mut luma = self.luma;
        for pixel in luma.pixels_mut() {
            pixel.0[0] = if pixel.0[0] <= level { 0 } else { 255 };
        }
        Self { luma }
    }
}

// -- Summed-area tables -------------------------------------------------------

/// Sums of values and squared values, `(width + 1) x (height + 1)` with a
/// zero first row and column.
struct SummedArea {
    width: u32,
    height: u32,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl SummedArea {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let stride = (width + 1) as usize;
        let mut sum = vec![0u64; stride * (height + 1) as usize];
        let mut sum_sq = vec![0u64; stride * (height + 1) as usize];

        for y in 0..height {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..width {
                let v = gray.get_pixel(x, y).0[0] as u64;
                row += v;
                row_sq += v * v;
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                sum[idx] = row + sum[above];
                sum_sq[idx] = row_sq + sum_sq[above];
            }
        }

        Self {
            width,
            height,
            sum,
            sum_sq,
        }
    }

    /// Mean and variance of the square window centred on `(cx, cy)`, clipped
    /// to the image.
    fn window_stats(&self, cx: u32, cy: u32, radius: u32) -> (f64, f64) {
        let stride = (self.width + 1) as usize;
        let x1 = cx.saturating_sub(radius) as usize;
        let y1 = cy.saturating_sub(radius) as usize;
        let x2 = (cx.saturating_add(radius).saturating_add(1) as usize).min(self.width as usize);
        let y2 = (cy.saturating_add(radius).saturating_add(1) as usize).min(self.height as usize);

        let count = ((x2 - x1) * (y2 - y1)) as f64;
        if count == 0.0 {
            return (128.0, 0.0);
        }

        let rect = |table: &[u64]| {
            table[y2 * stride + x2] as f64 - table[y1 * stride + x2] as f64
                - table[y2 * stride + x1] as f64
                + table[y1 * stride + x1] as f64
        };
        let mean = rect(&self.sum) / count;
        let variance = rect(&self.sum_sq) / count - mean * mean;
        (mean, variance)
    }
}
