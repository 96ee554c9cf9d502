//! Vectorization pipeline: binary mask → closed Bezier paths.
//!
//! 1. Pixel-edge contour extraction (dual grid)
//! 2. Optimal polygon approximation (DP) with sub-pixel vertex refinement
//! 3. Alpha-based corner detection, Bezier curve generation and
//!    optional segment merging

pub mod curve;
pub mod decompose;
pub mod polygon;

use log::debug;
use rayon::prelude::*;

use crate::config::TracingConfig;
use crate::mask::BinaryMask;
use crate::path::Path;

/// Run the core pipeline on a mask. Paths come back in contour discovery
/// order.
///
/// The configuration is assumed to be valid; see
/// [`TracingConfig::validate`].
pub fn trace(mask: &BinaryMask, config: &TracingConfig) -> Vec<Path> {
    // Stage 1: Extract pixel-edge contours on the dual grid.
    let contours = decompose::decompose(mask, config.min_area, config.turn_policy);
    debug!(
        "vectorize: {} contours ({} policy, min_area {})",
        contours.len(),
        config.turn_policy,
        config.min_area
    );

    // Stages 2-3 are independent per contour; the indexed parallel
    // iterator keeps discovery order on collect.
    let params = curve::CurveParams::from(config);
    contours
        .into_par_iter()
        .map(|contour| curve::fit(polygon::extract(contour), &params))
        .collect()
}
