//! Short-time Fourier transform.

use crate::config::SignalConfig;
use crate::constants::signal::MIN_WINDOW_SAMPLES;
use crate::error::{Error, Result};
use crate::signal::window::window_coefficients;
use ndarray::Array2;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Amplitude spectrogram with shape `(time_bins, freq_bins)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: Array2<f32>,
}

impl Spectrogram {
    /// Wrap an existing `(time, freq)` amplitude grid.
    pub fn from_array(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Number of analysis frames.
    pub fn time_bins(&self) -> usize {
        self.data.nrows()
    }

    /// Number of frequency bins (`window / 2 + 1`).
    pub fn freq_bins(&self) -> usize {
        self.data.ncols()
    }

    /// Amplitude grid indexed `[time, freq]`.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }
}

/// Turns a waveform into an amplitude spectrogram.
///
/// The FFT plan and window are built once; `generate` is safe to call from
/// many threads at the same time.
pub struct SpectrogramGenerator {
    plan: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    window_len: usize,
    step: usize,
    pad_short: bool,
}

impl std::fmt::Debug for SpectrogramGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramGenerator")
            .field("window_len", &self.window_len)
            .field("step", &self.step)
            .field("pad_short", &self.pad_short)
            .finish_non_exhaustive()
    }
}

impl SpectrogramGenerator {
    /// Build a generator from signal settings.
    pub fn new(config: &SignalConfig) -> Result<Self> {
        let window_len = config.window_samples();
        if window_len < MIN_WINDOW_SAMPLES {
            return Err(Error::ConfigValidation {
                message: format!(
                    "analysis window is {window_len} samples; at least {MIN_WINDOW_SAMPLES} required"
                ),
            });
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(window_len);

        Ok(Self {
            plan,
            window: window_coefficients(config.window, window_len),
            window_len,
            step: config.step_samples(),
            pad_short: config.pad_short,
        })
    }

    /// Window length in samples.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Hop size in samples.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of frames produced for `n` samples.
    pub fn frame_count(&self, n: usize) -> Result<usize> {
        if n >= self.window_len {
            Ok((n - self.window_len) / self.step + 1)
        } else if self.pad_short {
            Ok(1)
        } else {
            Err(Error::RecordingTooShort {
                samples: n,
                window: self.window_len,
            })
        }
    }

    /// Compute the amplitude spectrogram of `samples`.
    ///
    /// Recordings shorter than one window are zero-padded to a single frame
    /// when padding is enabled.
    pub fn generate(&self, samples: &[f32]) -> Result<Spectrogram> {
        let frames = self.frame_count(samples.len())?;
        let freq_bins = self.window_len / 2 + 1;

        let mut input = self.plan.make_input_vec();
        let mut spectrum = self.plan.make_output_vec();
        let mut scratch = self.plan.make_scratch_vec();
        let mut data = Array2::<f32>::zeros((frames, freq_bins));

        for (frame, mut row) in data.rows_mut().into_iter().enumerate() {
            let start = frame * self.step;
            let end = (start + self.window_len).min(samples.len());
            let segment = &samples[start.min(end)..end];

            for (i, slot) in input.iter_mut().enumerate() {
                *slot = segment.get(i).map_or(0.0, |&s| s * self.window[i]);
            }

            self.plan
                .process_with_scratch(&mut input, &mut spectrum, &mut scratch)
                .map_err(|e| Error::Fft {
                    reason: e.to_string(),
                })?;

            for (cell, bin) in row.iter_mut().zip(&spectrum) {
                *cell = bin.norm();
            }
        }

        Ok(Spectrogram { data })
    }
}
