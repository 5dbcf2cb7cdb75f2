//! Raw waveform loading.
//!
//! Recordings are either delimited numeric dumps (`csv`, `txt`, `dat`) or
//! PCM WAV files. Every recording in a corpus shares one sample rate.

use crate::constants::signal::{TEXT_EXTENSIONS, WAV_EXTENSION};
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One raw time-domain recording.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Identifier derived from the file stem.
    pub id: String,
    /// Native class name.
    pub class: String,
    /// Source file.
    pub path: PathBuf,
    /// Amplitude samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

impl Recording {
    /// Duration in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Identifier for a recording file.
pub fn recording_id(path: &Path) -> String {
    path.file_stem().map_or_else(
        || "recording".to_string(),
        |s| s.to_string_lossy().into_owned(),
    )
}

/// Check if a file has a supported recording extension.
pub fn is_recording_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        TEXT_EXTENSIONS
            .iter()
            .chain(std::iter::once(&WAV_EXTENSION))
            .any(|known| ext.eq_ignore_ascii_case(OsStr::new(known)))
    })
}

/// Load a recording from disk.
///
/// The identifier is the file stem. WAV files must declare `sample_rate`.
pub fn load_recording(path: &Path, class: &str, sample_rate: f64) -> Result<Recording> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OsStr::new(WAV_EXTENSION)));

    let samples = if is_wav {
        read_wav_samples(path, sample_rate)?
    } else {
        read_text_samples(path)?
    };

    if samples.is_empty() {
        return Err(Error::MalformedRecording {
            path: path.to_path_buf(),
            reason: "no samples".to_string(),
        });
    }

    Ok(Recording {
        id: recording_id(path),
        class: class.to_string(),
        path: path.to_path_buf(),
        samples,
        sample_rate,
    })
}

/// Read comma, newline or whitespace separated numeric samples.
fn read_text_samples(path: &Path) -> Result<Vec<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::RecordingRead {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut samples = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::RecordingRead {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        for field in &record {
            for token in field.split_whitespace() {
                let value: f32 = token.parse().map_err(|_| Error::MalformedRecording {
                    path: path.to_path_buf(),
                    reason: format!("line {}: '{token}' is not a number", line + 1),
                })?;
                if !value.is_finite() {
                    return Err(Error::MalformedRecording {
                        path: path.to_path_buf(),
                        reason: format!("line {}: non-finite sample '{token}'", line + 1),
                    });
                }
                samples.push(value);
            }
        }
    }

    Ok(samples)
}

/// Read a WAV file as mono samples in [-1, 1].
fn read_wav_samples(path: &Path, expected_rate: f64) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(path).map_err(|e| Error::RecordingRead {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let spec = reader.spec();
    let actual = f64::from(spec.sample_rate);
    if (actual - expected_rate).abs() > f64::EPSILON {
        return Err(Error::SampleRateMismatch {
            path: path.to_path_buf(),
            actual,
            expected: expected_rate,
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / f64::from(1_u32 << (spec.bits_per_sample.clamp(1, 32) - 1));
            #[allow(clippy::cast_possible_truncation)]
            let samples = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (f64::from(v) * scale) as f32))
                .collect::<std::result::Result<_, _>>();
            samples
        }
    }
    .map_err(|e| Error::RecordingRead {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let channels = usize::from(spec.channels.max(1));
    if channels == 1 {
        return Ok(interleaved);
    }

    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * inv)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_load_single_line_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "10000L_0.csv", "0.5,-1.25,3,0\n");

        let recording = load_recording(&path, "ar", 1000.0).unwrap();
        assert_eq!(recording.id, "10000L_0");
        assert_eq!(recording.class, "ar");
        assert_eq!(recording.samples, vec![0.5, -1.25, 3.0, 0.0]);
    }

    #[test]
    fn test_load_mixed_separators() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "mixed.txt", "1 2 3\n4,5\n\n6\n");

        let recording = load_recording(&path, "background", 1000.0).unwrap();
        assert_eq!(recording.samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_load_rejects_non_numeric() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "1,2,abc\n");

        let err = load_recording(&path, "ar", 1000.0).unwrap_err();
        assert!(matches!(err, Error::MalformedRecording { .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_load_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "");

        let err = load_recording(&path, "ar", 1000.0).unwrap_err();
        assert!(matches!(err, Error::MalformedRecording { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_recording(Path::new("/nonexistent/x.csv"), "ar", 1000.0).unwrap_err();
        assert!(matches!(err, Error::RecordingRead { .. }));
    }

    #[test]
    fn test_load_wav_mono_and_rate_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(16384_i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let recording = load_recording(&path, "ar", 8000.0).unwrap();
        assert_eq!(recording.samples.len(), 4);
        assert!((recording.samples[0] - 0.25).abs() < 1e-6);

        let err = load_recording(&path, "ar", 16000.0).unwrap_err();
        assert!(matches!(err, Error::SampleRateMismatch { .. }));
    }

    #[test]
    fn test_is_recording_file() {
        assert!(is_recording_file(Path::new("a.csv")));
        assert!(is_recording_file(Path::new("a.TXT")));
        assert!(is_recording_file(Path::new("a.wav")));
        assert!(!is_recording_file(Path::new("a.png")));
        assert!(!is_recording_file(Path::new("README")));
    }
}
