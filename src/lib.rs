//! img2eq: binary mask → cubic bezier paths → parametric equations.
//!
//! Traces the boundaries of a binary mask into closed paths of corner
//! and cubic Bézier segments, then writes each segment as an `(x(t), y(t))`
//! equation for graphing tools.
//!
//! # Example
//!
//! ```
//! use img2eq::{trace, BinaryMask, EquationOptions, TracingConfig};
//!
//! let mask = BinaryMask::from_rows(&[
//!     [0u8, 0, 0, 0, 0],
//!     [0, 1, 1, 1, 0],
//!     [0, 1, 1, 1, 0],
//!     [0, 1, 1, 1, 0],
//!     [0, 0, 0, 0, 0],
//! ])?;
//! let result = trace(&mask, &TracingConfig::default())?;
//! assert_eq!(result.paths.len(), 1);
//! for eq in img2eq::equation::emit(&result, &EquationOptions::default()) {
//!     println!("{}", eq);
//! }
//! # Ok::<(), img2eq::TraceError>(())
//! ```

#![forbid(unsafe_code)]

mod bitmap;
mod config;
mod geom;
mod mask;
mod path;

pub mod equation;
pub mod error;
pub mod render;
pub mod vectorize;

// Re-export kurbo so downstream users get the same version used by the
// output types.
pub use kurbo;

pub use bitmap::{load_mask, mask_from_gray};
pub use config::{MaskConfig, MaskMethod, ThresholdMethod, TracingConfig, TurnPolicy};
pub use equation::{Equation, EquationOptions, EquationStyle, YAxis};
pub use error::TraceError;
pub use mask::BinaryMask;
pub use path::{BezierSegment, ContourType, CornerSegment, Path, Segment, TraceResult};

use log::info;
use std::time::Instant;

/// Trace a binary mask into closed paths.
///
/// Validates the configuration, then runs contour decomposition, polygon
/// extraction and curve fitting. Contours too small to form a polygon
/// come back as trivial paths rather than errors.
pub fn trace(mask: &BinaryMask, config: &TracingConfig) -> Result<TraceResult, TraceError> {
    config.validate()?;
    let t_start = Instant::now();

    let paths = vectorize::trace(mask, config);

    let result = TraceResult {
        width: mask.width(),
        height: mask.height(),
        paths,
    };

    let (n_outer, n_hole) = result.contour_counts();
    let n_trivial = result.paths.iter().filter(|p| p.trivial).count();
    info!(
        "Trace       {} contours ({} outer, {} hole, {} trivial) \u{00b7} {} segments ({} corners)  ({}ms)",
        result.paths.len(),
        n_outer,
        n_hole,
        n_trivial,
        result.segment_count(),
        result.corner_count(),
        t_start.elapsed().as_millis(),
    );

    Ok(result)
}

/// Full pipeline: image path → binary mask → traced paths.
///
/// Returns the mask alongside the result so callers can render a preview.
pub fn trace_image(
    image_path: &std::path::Path,
    mask_config: &MaskConfig,
    config: &TracingConfig,
) -> Result<(BinaryMask, TraceResult), TraceError> {
    config.validate()?;
    let mask = load_mask(image_path, mask_config)?;
    let result = trace(&mask, config)?;
    Ok((mask, result))
}
