//! Raster images as 8-bit grayscale PNG.

use crate::error::{Error, Result};
use crate::signal::Raster;
use image::{GrayImage, Luma};
use std::path::Path;

/// Write a raster as an S×S grayscale PNG, creating parent directories.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn save_raster(path: &Path, raster: &Raster) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let size = u32::try_from(raster.size()).map_err(|_| Error::DimensionMismatch {
        expected: "raster side within u32".to_string(),
        actual: raster.size().to_string(),
    })?;
    let data = raster.data();
    let image = GrayImage::from_fn(size, size, |x, y| {
        let value = data[[y as usize, x as usize]].clamp(0.0, 1.0);
        Luma([(value * 255.0).round() as u8])
    });

    image.save(path).map_err(|e| Error::RasterWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
