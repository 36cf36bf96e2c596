// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry: canonical corner ordering and mapping between model, analysis
// and sensor coordinate spaces.

pub mod corners;
pub mod mapping;

pub use corners::order_corners;
pub use mapping::CoordinateMapper;
