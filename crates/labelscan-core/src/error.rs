// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for labelscan.
//
// Only caller mistakes end up here. A frame without a usable label is a
// normal outcome and is reported through `DetectionResult::detected`.

use thiserror::Error;

/// Top-level error type for all labelscan operations.
#[derive(Debug, Error)]
pub enum LabelscanError {
    // -- Input errors --
    #[error(
        "probability grid is {actual_width}x{actual_height}, \
         detector is configured for {expected_width}x{expected_height}"
    )]
    GridShapeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("invalid probability grid: {0}")]
    InvalidGrid(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Processing errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("segmentation model failed: {0}")]
    Segmentation(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabelscanError>;
