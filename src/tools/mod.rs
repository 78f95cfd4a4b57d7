//! Boundary adapters between files and the analysis core
//!
//! Decoding is delegated to the `image` crate; the core itself never
//! touches files.

use crate::error::Result;
use crate::models::{BinaryMask, PixelGrid};
use std::path::Path;

/// Decode an image file into an 8-bit luma grid
pub fn load_grid<P: AsRef<Path>>(path: P) -> Result<PixelGrid> {
    let img = image::open(path)?;
    PixelGrid::try_from(&img.to_luma8())
}

/// Render a mask as a 0/255 gray grid, e.g. for an external encoder
pub fn mask_to_grid(mask: &BinaryMask) -> Result<PixelGrid> {
    let data = (0..mask.rows())
        .flat_map(|i| (0..mask.cols()).map(move |j| if mask.get(i, j) { 255 } else { 0 }))
        .collect();
    PixelGrid::new(mask.rows(), mask.cols(), data)
}
