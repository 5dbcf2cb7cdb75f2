//! Raster to feature vector conversion.

use crate::config::RasterConfig;
use crate::error::{Error, Result};
use crate::signal::Raster;
use tracing::debug;

/// Flattened, min-max normalized raster.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Feature values, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take ownership of the values.
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Converts rasters into feature vectors of length S².
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    size: usize,
    flip_vertical: bool,
}

impl FeatureExtractor {
    /// Build an extractor from raster settings.
    pub fn new(config: &RasterConfig) -> Self {
        Self {
            size: config.size,
            flip_vertical: config.flip_vertical,
        }
    }

    /// Length of every produced vector.
    pub fn feature_len(&self) -> usize {
        self.size * self.size
    }

    /// Orient, normalize and flatten a raster.
    ///
    /// Works for any input scale (unit intensities or 8-bit pixel values).
    /// A constant raster yields the all-zero vector.
    pub fn extract(&self, raster: &Raster) -> Result<FeatureVector> {
        if raster.size() != self.size {
            return Err(Error::DimensionMismatch {
                expected: format!("{0}x{0} raster", self.size),
                actual: format!("{0}x{0} raster", raster.size()),
            });
        }

        let grid = raster.data();
        let mut values = Vec::with_capacity(self.feature_len());
        if self.flip_vertical {
            for r in (0..grid.nrows()).rev() {
                values.extend(grid.row(r).iter().copied());
            }
        } else {
            values.extend(grid.iter().copied());
        }

        if !min_max_normalize(&mut values) {
            debug!("constant raster, using all-zero feature vector");
        }

        Ok(FeatureVector(values))
    }
}

/// Rescale `values` in place to [0, 1].
///
/// Returns `false` when the input is constant; the values are then set to 0.
pub fn min_max_normalize(values: &mut [f32]) -> bool {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if !(range > 0.0 && range.is_finite()) {
        values.fill(0.0);
        return false;
    }

    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn extractor(size: usize, flip_vertical: bool) -> FeatureExtractor {
        FeatureExtractor::new(&RasterConfig {
            size,
            flip_vertical,
            ..RasterConfig::default()
        })
    }

    #[test]
    fn test_extract_normalizes_to_unit_range() {
        let raster = Raster::new(array![[10.0, 20.0], [30.0, 50.0]]).unwrap();
        let features = extractor(2, false).extract(&raster).unwrap();
        assert_eq!(features.as_slice(), &[0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_extract_min_and_max_map_exactly() {
        let data = Array2::from_shape_fn((7, 7), |(r, c)| ((r * 13 + c * 5) % 17) as f32 + 3.0);
        let raster = Raster::new(data).unwrap();
        let features = extractor(7, true).extract(&raster).unwrap();

        assert_eq!(features.len(), 49);
        assert!(features.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(features.as_slice().contains(&0.0));
        assert!(features.as_slice().contains(&1.0));
    }

    #[test]
    fn test_extract_eight_bit_input() {
        let raster = Raster::new(array![[0.0, 255.0], [51.0, 255.0]]).unwrap();
        let features = extractor(2, false).extract(&raster).unwrap();
        assert_eq!(features.as_slice(), &[0.0, 1.0, 0.2, 1.0]);
    }

    #[test]
    fn test_extract_flips_rows() {
        let raster = Raster::new(array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let features = extractor(2, true).extract(&raster).unwrap();
        let expected = [2.0 / 3.0, 1.0, 0.0, 1.0 / 3.0];
        for (got, want) in features.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_constant_raster_falls_back_to_zeros() {
        let raster = Raster::new(Array2::from_elem((3, 3), 0.7)).unwrap();
        let features = extractor(3, true).extract(&raster).unwrap();
        assert_eq!(features.as_slice(), &[0.0; 9]);
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let raster = Raster::new(Array2::zeros((4, 4))).unwrap();
        let err = extractor(3, false).extract(&raster).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
