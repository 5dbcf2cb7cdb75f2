//! Window functions.

use crate::config::WindowFunction;
use std::f64::consts::PI;

/// Symmetric window coefficients of length `len`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn window_coefficients(kind: WindowFunction, len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }

    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / denom;
            let w = match kind {
                WindowFunction::Hamming => 0.54 - 0.46 * x.cos(),
                WindowFunction::Hann => 0.5 * (1.0 - x.cos()),
                WindowFunction::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                WindowFunction::Rectangular => 1.0,
            };
            w as f32
        })
        .collect()
}
