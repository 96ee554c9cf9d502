use std::path::Path;

use image::{GrayImage, ImageReader};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::edges::canny;
use log::info;

use crate::config::{MaskConfig, MaskMethod, ThresholdMethod};
use crate::error::TraceError;
use crate::mask::BinaryMask;

/// Load an image from disk and turn it into a binary mask.
pub fn load_mask(path: &Path, config: &MaskConfig) -> Result<BinaryMask, TraceError> {
    let gray = ImageReader::open(path)
        .map_err(|e| TraceError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| TraceError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .into_luma8();
    mask_from_gray(&gray, config)
}

/// Binarise a grayscale image: Canny edge pixels, or dark pixels under
/// a brightness threshold, become foreground.
pub fn mask_from_gray(gray: &GrayImage, config: &MaskConfig) -> Result<BinaryMask, TraceError> {
    config.validate()?;
    let (w, h) = gray.dimensions();

    let (mut binary, method) = match config.method {
        MaskMethod::Canny { low, high } => {
            (canny(gray, low, high), format!("canny {}/{}", low, high))
        }
        MaskMethod::Threshold(method) => {
            let (level, name) = match method {
                ThresholdMethod::Fixed(t) => (t, format!("fixed threshold {}", t)),
                ThresholdMethod::Otsu => {
                    let t = otsu_level(gray);
                    (t, format!("Otsu threshold {}", t))
                }
            };
            (threshold(gray, level, ThresholdType::BinaryInverted), name)
        }
    };

    if config.invert {
        for pixel in binary.pixels_mut() {
            pixel.0[0] = 255 - pixel.0[0];
        }
    }

    let mask = BinaryMask::from_gray(&binary)?;
    info!(
        "Load        {}x{} px, {}{} \u{2192} {} foreground px",
        w,
        h,
        method,
        if config.invert { ", inverted" } else { "" },
        mask.count()
    );
    Ok(mask)
}
