//! Rendering spectrograms onto a fixed square canvas.
//!
//! The canvas is independent of the native bin counts: each axis is resampled
//! separately (area averaging when shrinking, linear interpolation when
//! growing). Row 0 holds the highest frequency and column 0 the earliest
//! frame, matching how a spectrogram image is drawn. With the default
//! [`ColorMap::LowBright`] quiet cells are bright and energetic cells dark.

use crate::config::{AmplitudeScale, ColorMap, RasterConfig};
use crate::constants::signal::AMPLITUDE_FLOOR;
use crate::error::{Error, Result};
use crate::signal::Spectrogram;
use ndarray::Array2;

/// Single-channel square intensity grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    data: Array2<f32>,
}

impl Raster {
    /// Wrap a square grid.
    pub fn new(data: Array2<f32>) -> Result<Self> {
        if data.nrows() != data.ncols() || data.is_empty() {
            return Err(Error::DimensionMismatch {
                expected: "non-empty square raster".to_string(),
                actual: format!("{}x{}", data.nrows(), data.ncols()),
            });
        }
        Ok(Self { data })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    /// Intensity grid indexed `[row, column]`.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }
}

/// Renders spectrograms as [`Raster`]s.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    size: usize,
    color_map: ColorMap,
    amplitude_scale: AmplitudeScale,
}

impl Rasterizer {
    /// Build a rasterizer from raster settings.
    pub fn new(config: &RasterConfig) -> Self {
        Self {
            size: config.size,
            color_map: config.color_map,
            amplitude_scale: config.amplitude_scale,
        }
    }

    /// Render a spectrogram onto the S×S canvas.
    pub fn render(&self, spectrogram: &Spectrogram) -> Result<Raster> {
        let s = self.size;
        let amplitudes = spectrogram.data();
        let (time_bins, freq_bins) = amplitudes.dim();
        if time_bins == 0 || freq_bins == 0 {
            return Err(Error::DimensionMismatch {
                expected: "non-empty spectrogram".to_string(),
                actual: format!("{time_bins}x{freq_bins}"),
            });
        }

        // time axis first: one resampled row of length S per frequency bin
        let mut by_freq = Array2::<f32>::zeros((freq_bins, s));
        let mut column = Vec::with_capacity(time_bins);
        for f in 0..freq_bins {
            column.clear();
            column.extend(amplitudes.column(f).iter().map(|&a| self.scale(a)));
            for (t, value) in resample_axis(&column, s).into_iter().enumerate() {
                by_freq[[f, t]] = value;
            }
        }

        let mut grid = Array2::<f32>::zeros((s, s));
        let mut spectrum = Vec::with_capacity(freq_bins);
        for t in 0..s {
            spectrum.clear();
            spectrum.extend(by_freq.column(t).iter().copied());
            for (k, value) in resample_axis(&spectrum, s).into_iter().enumerate() {
                grid[[s - 1 - k, t]] = value;
            }
        }

        let (min, max) = grid
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        grid.mapv_inplace(|v| {
            let level = if range > 0.0 { (v - min) / range } else { 0.0 };
            match self.color_map {
                ColorMap::LowBright => 1.0 - level,
                ColorMap::HighBright => level,
            }
        });

        Raster::new(grid)
    }

    fn scale(&self, amplitude: f32) -> f32 {
        match self.amplitude_scale {
            AmplitudeScale::Decibel => 20.0 * amplitude.max(AMPLITUDE_FLOOR).log10(),
            AmplitudeScale::Linear => amplitude,
        }
    }
}

/// Resample a 1-D profile to `len` points.
///
/// Shrinking averages the source bins covered by each target cell (weighted
/// by overlap); growing interpolates linearly between bin centres.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn resample_axis(src: &[f32], len: usize) -> Vec<f32> {
    let n = src.len();
    if n == 0 || len == 0 {
        return vec![0.0; len];
    }
    if n == 1 {
        return vec![src[0]; len];
    }

    let ratio = n as f64 / len as f64;
    if n >= len {
        (0..len)
            .map(|i| {
                let start = i as f64 * ratio;
                let end = (i + 1) as f64 * ratio;
                let first = start.floor() as usize;
                let last = (end.ceil() as usize).min(n);
                let mut acc = 0.0_f64;
                for (j, &value) in src.iter().enumerate().take(last).skip(first) {
                    let overlap = end.min((j + 1) as f64) - start.max(j as f64);
                    if overlap > 0.0 {
                        acc += f64::from(value) * overlap;
                    }
                }
                (acc / ratio) as f32
            })
            .collect()
    } else {
        (0..len)
            .map(|i| {
                let pos = ((i as f64 + 0.5) * ratio - 0.5).clamp(0.0, (n - 1) as f64);
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(n - 1);
                let frac = (pos - lo as f64) as f32;
                src[lo] * (1.0 - frac) + src[hi] * frac
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(size: usize, color_map: ColorMap, amplitude_scale: AmplitudeScale) -> RasterConfig {
        RasterConfig {
            size,
            color_map,
            amplitude_scale,
            flip_vertical: false,
        }
    }

    #[test]
    fn test_resample_identity() {
        let src = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(resample_axis(&src, 4), src.to_vec());
    }

    #[test]
    fn test_resample_area_average() {
        let src = [1.0, 3.0, 5.0, 7.0];
        assert_eq!(resample_axis(&src, 2), vec![2.0, 6.0]);

        // fractional coverage: 3 bins into 2 cells
        let out = resample_axis(&[0.0, 3.0, 6.0], 2);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[1] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_upsampling_interpolates() {
        let out = resample_axis(&[0.0, 1.0], 4);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3], 1.0);
        assert!(out[1] > 0.0 && out[1] < out[2] && out[2] < 1.0);
    }

    #[test]
    fn test_render_has_fixed_size_regardless_of_bins() {
        let rasterizer = Rasterizer::new(&config(8, ColorMap::LowBright, AmplitudeScale::Decibel));
        for (t, f) in [(1, 3), (5, 33), (100, 9), (40, 200)] {
            let spectrogram = Spectrogram::from_array(Array2::from_elem((t, f), 1.0));
            let raster = rasterizer.render(&spectrogram).unwrap();
            assert_eq!(raster.size(), 8, "{t}x{f}");
        }
    }

    #[test]
    fn test_render_orientation_and_color_map() {
        // two frames, two bins; only the highest frequency carries energy
        let spectrogram = Spectrogram::from_array(array![[0.0, 10.0], [0.0, 10.0]]);

        let low_bright =
            Rasterizer::new(&config(2, ColorMap::LowBright, AmplitudeScale::Linear));
        let raster = low_bright.render(&spectrogram).unwrap();
        // top row is the high frequency, rendered dark
        assert_eq!(raster.data()[[0, 0]], 0.0);
        assert_eq!(raster.data()[[1, 0]], 1.0);

        let high_bright =
            Rasterizer::new(&config(2, ColorMap::HighBright, AmplitudeScale::Linear));
        let raster = high_bright.render(&spectrogram).unwrap();
        assert_eq!(raster.data()[[0, 1]], 1.0);
        assert_eq!(raster.data()[[1, 1]], 0.0);
    }

    #[test]
    fn test_render_values_in_unit_range() {
        let rasterizer = Rasterizer::new(&config(16, ColorMap::LowBright, AmplitudeScale::Decibel));
        let data = Array2::from_shape_fn((37, 21), |(t, f)| ((t * 31 + f * 7) % 13) as f32);
        let raster = rasterizer.render(&Spectrogram::from_array(data)).unwrap();
        assert!(raster.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_raster_must_be_square() {
        assert!(Raster::new(Array2::zeros((3, 4))).is_err());
        assert!(Raster::new(Array2::zeros((0, 0))).is_err());
    }
}
