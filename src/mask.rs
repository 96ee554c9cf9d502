//! Binary input mask.
//!
//! Row 0 is the top of the image and y grows downward. Pixel `(x, y)`
//! covers the unit square `[x, x+1] × [y, y+1]` of the pixel-corner grid
//! that contours are traced on.

use image::GrayImage;

use crate::error::TraceError;

/// A rectangular grid of foreground (`true`) / background (`false`) cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    data: Vec<bool>,
    width: u32,
    height: u32,
}

impl BinaryMask {
    /// Build a mask from row-major cells.
    ///
    /// Fails when either dimension is zero or `data` does not hold
    /// exactly `width * height` cells.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Result<Self, TraceError> {
        if width == 0 || height == 0 {
            return Err(TraceError::InvalidInput(format!(
                "mask must be non-empty, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(TraceError::InvalidInput(format!(
                "{}x{} mask needs {} cells, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// An all-background mask.
    pub fn empty(width: u32, height: u32) -> Result<Self, TraceError> {
        Self::new(width, height, vec![false; width as usize * height as usize])
    }

    /// Build a mask from rows of 0/1 (any non-zero value is foreground).
    ///
    /// Every row must have the same, non-zero length.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, TraceError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(TraceError::InvalidInput("mask has no cells".to_string()));
        }
        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(TraceError::InvalidInput(format!(
                    "mask is not rectangular: row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend(row.iter().map(|&v| v != 0));
        }
        Self::new(width as u32, height as u32, data)
    }

    /// Build a mask from a grayscale image (non-zero = foreground), as
    /// produced by an edge detector or a binary threshold.
    pub fn from_gray(img: &GrayImage) -> Result<Self, TraceError> {
        let (w, h) = img.dimensions();
        let data = img.pixels().map(|p| p.0[0] > 0).collect();
        Self::new(w, h, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get cell at (x, y). Out-of-bounds = background.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Set cell at (x, y). Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.data[y as usize * self.width as usize + x as usize] = value;
    }

    /// Number of foreground cells.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.data
    }
}
