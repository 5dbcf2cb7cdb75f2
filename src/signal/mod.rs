//! Signal processing: waveform loading, STFT and rasterization.

mod raster;
mod recording;
mod stft;
mod window;

pub use raster::{Raster, Rasterizer, resample_axis};
pub use recording::{Recording, is_recording_file, load_recording, recording_id};
pub use stft::{Spectrogram, SpectrogramGenerator};
pub use window::window_coefficients;
