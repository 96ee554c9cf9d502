use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// All tracing parameters in one struct.
/// Serializable so presets can be saved alongside traced output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    // -- Path decomposition --
    /// Contours enclosing fewer pixels than this are dropped as speckles
    /// ("turd size").
    pub min_area: u64,
    /// How ambiguous diagonal junctions are resolved while following a
    /// boundary.
    pub turn_policy: TurnPolicy,

    // -- Curve generation --
    /// Corner threshold. Vertices whose strength reaches this value
    /// become sharp corners. 0 = every vertex is a corner; above 4/3 the
    /// whole path is smooth.
    pub alphamax: f64,
    /// Merge runs of smooth segments into longer curves.
    pub opticurve: bool,
    /// Maximum deviation (in pixels) tolerated when merging segments.
    pub opttolerance: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            min_area: 2,
            turn_policy: TurnPolicy::Minority,
            alphamax: 1.0,
            opticurve: true,
            opttolerance: 0.2,
        }
    }
}

impl TracingConfig {
    /// Check every numeric parameter against its domain.
    pub fn validate(&self) -> Result<(), TraceError> {
        if !self.alphamax.is_finite() || self.alphamax < 0.0 {
            return Err(TraceError::Configuration(format!(
                "alphamax must be a finite value >= 0, got {}",
                self.alphamax
            )));
        }
        if !self.opttolerance.is_finite() || self.opttolerance <= 0.0 {
            return Err(TraceError::Configuration(format!(
                "opttolerance must be a finite value > 0, got {}",
                self.opttolerance
            )));
        }
        Ok(())
    }
}

/// Rule for resolving an ambiguous turn at a diagonal pinch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    /// Connect foreground diagonally (right on outer boundaries, left on holes).
    Black,
    /// Connect background diagonally.
    White,
    Left,
    Right,
    /// Prefer the locally less frequent color.
    Minority,
    /// Prefer the locally more frequent color.
    Majority,
}

impl TurnPolicy {
    pub fn name(self) -> &'static str {
        match self {
            TurnPolicy::Black => "black",
            TurnPolicy::White => "white",
            TurnPolicy::Left => "left",
            TurnPolicy::Right => "right",
            TurnPolicy::Minority => "minority",
            TurnPolicy::Majority => "majority",
        }
    }
}

impl fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an input image becomes a binary mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskConfig {
    pub method: MaskMethod,
    /// If true, swap foreground and background after binarisation.
    pub invert: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            method: MaskMethod::Canny {
                low: 150.0,
                high: 150.0,
            },
            invert: false,
        }
    }
}

impl MaskConfig {
    pub fn validate(&self) -> Result<(), TraceError> {
        if let MaskMethod::Canny { low, high } = self.method {
            if !low.is_finite() || !high.is_finite() || low < 0.0 || high < low {
                return Err(TraceError::Configuration(format!(
                    "canny thresholds must satisfy 0 <= low <= high, got low={} high={}",
                    low, high
                )));
            }
        }
        Ok(())
    }
}

/// Binarisation method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaskMethod {
    /// Canny edge detection; edge pixels are foreground.
    Canny { low: f32, high: f32 },
    /// Brightness threshold; dark pixels are foreground.
    Threshold(ThresholdMethod),
}

/// Threshold method for converting a grayscale image to binary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// Fixed brightness threshold (0-255).
    Fixed(u8),
    /// Otsu's method (automatic).
    Otsu,
}
