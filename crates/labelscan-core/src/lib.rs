// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labelscan-core: types, configuration and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod grid;
pub mod types;

pub use config::{CorrectionConfig, DetectorConfig, InterpolationKind, ScanConfig};
pub use error::LabelscanError;
pub use grid::ProbabilityGrid;
pub use types::*;
