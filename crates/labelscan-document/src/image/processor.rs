// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame preparation: decode, orient to the analysis space, downscale to the
// model input, crop and encode.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use labelscan_core::error::{LabelscanError, Result};
use labelscan_core::{BoundingBox, Rotation};
use tracing::{debug, info, instrument};

/// One camera frame on its way through the pipeline.
///
/// Each transformation consumes `self` and returns the new frame, so calls
/// chain:
///
/// ```ignore
/// let input = FrameProcessor::open("frame.jpg")?
///     .orient(Rotation::Deg90)
///     .to_model_input(256, 256);
/// ```
pub struct FrameProcessor {
    image: DynamicImage,
}

impl FrameProcessor {
    // -- Construction ---------------------------------------------------------

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            LabelscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Frame loaded");
        Ok(Self { image: img })
    }

    /// Decode a frame from encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            LabelscanError::ImageError(format!("failed to decode frame: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Frame decoded");
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate a sensor-oriented frame clockwise by `rotation` so it is upright
    /// in the analysis space.
    pub fn orient(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Deg0 => self.image,
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        Self { image }
    }

    /// Stretch to exactly `width x height`, ignoring aspect ratio.
    ///
    /// Segmentation models take a fixed square input; the stretch is undone
    /// when corners are scaled back out of model space.
    #[instrument(skip(self))]
    pub fn to_model_input(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            "Resizing to model input"
        );
        Self {
            image: self.image.resize_exact(width, height, FilterType::Triangle),
        }
    }

    /// Crop to `bbox`, rounded outwards and clamped to the frame.
    ///
    /// Returns the frame unchanged if the clamped box is empty.
    pub fn crop_bounding_box(self, bbox: &BoundingBox) -> Self {
        let (img_w, img_h) = (self.image.width(), self.image.height());
        let x0 = (bbox.x.floor().max(0.0) as u32).min(img_w);
        let y0 = (bbox.y.floor().max(0.0) as u32).min(img_h);
        let x1 = ((bbox.x + bbox.width).ceil().max(0.0) as u32).min(img_w);
        let y1 = ((bbox.y + bbox.height).ceil().max(0.0) as u32).min(img_h);
        if x1 <= x0 || y1 <= y0 {
            debug!(?bbox, "Bounding box outside frame; not cropping");
            return self;
        }
        Self {
            image: self.image.crop_imm(x0, y0, x1 - x0, y1 - y0),
        }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| LabelscanError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write to a file; the format follows the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            LabelscanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
