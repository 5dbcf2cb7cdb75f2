//! Recording to feature vector processing.

use crate::config::Config;
use crate::dataset::{Corpus, CorpusBuilder, LabelSet};
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::output::{Failure, inc_progress, save_raster};
use crate::pipeline::{CorpusEntry, raster_path_for};
use crate::signal::{Rasterizer, SpectrogramGenerator, load_recording};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns one recording into its feature vector.
///
/// Holds the transform plan and the raster settings so batches of
/// recordings can share them across worker threads.
#[derive(Debug)]
pub struct RecordingProcessor {
    generator: SpectrogramGenerator,
    rasterizer: Rasterizer,
    extractor: FeatureExtractor,
    sample_rate: f64,
}

impl RecordingProcessor {
    /// Build a processor from the signal and raster settings.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            generator: SpectrogramGenerator::new(&config.signal)?,
            rasterizer: Rasterizer::new(&config.raster),
            extractor: FeatureExtractor::new(&config.raster),
            sample_rate: config.signal.sample_rate,
        })
    }

    /// Length of the vectors this processor produces.
    pub fn feature_len(&self) -> usize {
        self.extractor.feature_len()
    }

    /// Load, transform, rasterize and flatten one recording.
    ///
    /// When `raster_dir` is set the raster is also written as a PNG under it.
    /// The waveform and spectrogram are dropped before returning.
    pub fn process(&self, entry: &CorpusEntry, raster_dir: Option<&Path>) -> Result<FeatureVector> {
        let recording = load_recording(&entry.path, &entry.class, self.sample_rate)?;
        debug!(
            "{}: {} samples ({:.6}s)",
            recording.id,
            recording.samples.len(),
            recording.duration_secs()
        );
        let spectrogram = self.generator.generate(&recording.samples)?;
        drop(recording);

        let raster = self.rasterizer.render(&spectrogram)?;
        drop(spectrogram);

        if let Some(dir) = raster_dir {
            save_raster(&raster_path_for(dir, &entry.class, &entry.id()), &raster)?;
        }
        self.extractor.extract(&raster)
    }
}

/// Corpus assembled from a directory tree, with the recordings that failed.
#[derive(Debug)]
pub struct CorpusOutcome {
    /// Every recording that produced a feature vector.
    pub corpus: Corpus,
    /// Recordings skipped because processing failed.
    pub failures: Vec<Failure>,
}

/// Process every entry and assemble the labeled corpus.
///
/// Recordings are processed in parallel batches of
/// `config.processing.batch_size`. A failing recording is logged and
/// recorded without stopping the run; rows keep the entry order.
///
/// # Errors
///
/// Returns an error if the processor cannot be built or a declared class
/// ends up with no successfully processed recording.
pub fn process_corpus(
    entries: &[CorpusEntry],
    config: &Config,
    raster_dir: Option<&Path>,
    progress: Option<&ProgressBar>,
) -> Result<CorpusOutcome> {
    let start = Instant::now();
    let processor = RecordingProcessor::new(config)?;
    let label_set = LabelSet::new(&config.dataset.classes);
    let mut builder = CorpusBuilder::new(label_set, processor.feature_len());
    builder.reserve(entries.len());
    let mut failures = Vec::new();

    for batch in entries.chunks(config.processing.batch_size.max(1)) {
        let results: Vec<Result<FeatureVector>> = batch
            .par_iter()
            .map(|entry| {
                let result = processor.process(entry, raster_dir);
                inc_progress(progress);
                result
            })
            .collect();

        for (entry, result) in batch.iter().zip(results) {
            let id = entry.id();
            match result {
                Ok(features) => {
                    debug!("{}: {} features", entry.path.display(), features.len());
                    builder.push(id, &entry.class, features)?;
                }
                Err(e) => {
                    let reason = e.render_chain();
                    warn!("Skipping {}: {}", entry.path.display(), reason);
                    failures.push(Failure {
                        identifier: id,
                        class: entry.class.clone(),
                        path: entry.path.clone(),
                        reason,
                    });
                }
            }
        }
    }

    info!(
        "Processed {} recordings in {:.2}s ({} succeeded, {} failed)",
        entries.len(),
        start.elapsed().as_secs_f64(),
        builder.len(),
        failures.len()
    );

    let corpus = builder.finish(&config.dataset.background_class)?;
    Ok(CorpusOutcome { corpus, failures })
}
