// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LabelscanError, Result};

/// Top-level scanner settings, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detector: DetectorConfig,
    pub correction: CorrectionConfig,
}

impl ScanConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()
    }
}

/// Settings for the boundary-extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Width of the probability grid the segmentation model produces.
    pub model_width: u32,
    /// Height of the probability grid the segmentation model produces.
    pub model_height: u32,
    /// Contours enclosing less than this fraction of the grid are discarded.
    pub min_area_fraction: f64,
    /// Contours enclosing more than this fraction of the grid are discarded.
    pub max_area_fraction: f64,
    /// Polygon simplification tolerances, as fractions of contour perimeter,
    /// tried in order until one yields four vertices.
    pub simplify_tolerances: Vec<f64>,
    /// Candidates with two corners closer than this (grid units) are dropped.
    pub min_corner_distance: f32,
    /// Minimum composite score accepted in live mode.
    pub live_min_score: f32,
    /// Minimum composite score accepted for a final capture.
    pub final_min_score: f32,
    /// Upper bound on the binarization threshold in live mode.
    pub live_threshold_cap: f32,
    /// Grid values above this count towards the reported confidence.
    pub confidence_cutoff: f32,
    /// Outward growth of the display corners from the centroid.
    pub expand_ratio: f32,
    /// Morphology radius; 1 gives a 3x3 structuring element.
    pub morph_radius: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_width: 256,
            model_height: 256,
            min_area_fraction: 0.005,
            max_area_fraction: 0.9,
            simplify_tolerances: vec![0.02, 0.03, 0.04, 0.05],
            min_corner_distance: 3.0,
            live_min_score: 0.4,
            final_min_score: 0.5,
            live_threshold_cap: 0.15,
            confidence_cutoff: 0.5,
            expand_ratio: 0.02,
            morph_radius: 1,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_width == 0 || self.model_height == 0 {
            return Err(invalid("model dimensions must be non-zero"));
        }
        let fraction = |v: f64| v > 0.0 && v <= 1.0;
        if !fraction(self.min_area_fraction) || !fraction(self.max_area_fraction) {
            return Err(invalid("area fractions must lie in (0, 1]"));
        }
        if self.min_area_fraction >= self.max_area_fraction {
            return Err(invalid("min_area_fraction must be below max_area_fraction"));
        }
        if self.simplify_tolerances.is_empty() {
            return Err(invalid("at least one simplification tolerance is required"));
        }
        if self.simplify_tolerances.iter().any(|t| !(t.is_finite() && *t > 0.0)) {
            return Err(invalid("simplification tolerances must be positive"));
        }
        let unit = |v: f32| (0.0..=1.0).contains(&v);
        if !unit(self.live_min_score)
            || !unit(self.final_min_score)
            || !unit(self.live_threshold_cap)
            || !unit(self.confidence_cutoff)
        {
            return Err(invalid("scores, caps and cutoffs must lie in [0, 1]"));
        }
        if !(self.expand_ratio.is_finite() && self.expand_ratio >= 0.0) {
            return Err(invalid("expand_ratio must be non-negative"));
        }
        if !(self.min_corner_distance.is_finite() && self.min_corner_distance >= 0.0) {
            return Err(invalid("min_corner_distance must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> LabelscanError {
    LabelscanError::InvalidConfig(message.to_string())
}

/// Resampling used when warping the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    Nearest,
    Bilinear,
    Bicubic,
}

/// Settings for the perspective-correction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub interpolation: InterpolationKind,
    /// RGBA fill for output pixels that map outside the source image.
    pub background: [u8; 4],
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationKind::Bilinear,
            background: [255, 255, 255, 255],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        ScanConfig::default().validate().expect("defaults must validate");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ScanConfig::from_json_str(
            r#"{ "detector": { "model_width": 320, "model_height": 320 } }"#,
        )
        .expect("should parse");
        assert_eq!(config.detector.model_width, 320);
        assert_eq!(config.detector.simplify_tolerances, vec![0.02, 0.03, 0.04, 0.05]);
        assert_eq!(config.correction.interpolation, InterpolationKind::Bilinear);
    }

    #[test]
    fn rejects_inverted_area_band() {
        let json = r#"{ "detector": { "min_area_fraction": 0.5, "max_area_fraction": 0.2 } }"#;
        let err = ScanConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, LabelscanError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_tolerances() {
        let mut config = DetectorConfig::default();
        config.simplify_tolerances.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_model_size() {
        let config = DetectorConfig {
            model_width: 0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "correction": {{ "interpolation": "bicubic", "background": [0, 0, 0, 255] }} }}"#
        )
        .expect("write config");

        let config = ScanConfig::load(file.path()).expect("should load");
        assert_eq!(config.correction.interpolation, InterpolationKind::Bicubic);
        assert_eq!(config.correction.background, [0, 0, 0, 255]);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScanConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LabelscanError::Io(_)));
    }
}
