//! Output artifacts: feature tables, rasters, failure log and run report.

mod csv;
mod parquet;
mod progress;
mod raster;
mod report;
mod writer;

pub use csv::{CsvWriter, Failure, read_feature_table, write_failures};
pub use parquet::ParquetWriter;
pub use progress::{create_fit_progress, create_recording_progress, finish_progress, inc_progress};
pub use raster::save_raster;
pub use report::{ClassCount, CorpusSummary, ModelReport, RunReport, TaskReport};
pub use writer::{TableWriter, table_columns};

use crate::config::OutputFormat;
use crate::constants::output::FEATURE_TABLE;
use crate::dataset::Corpus;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the feature table for `format` under `output_dir`.
pub fn feature_table_path(output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{FEATURE_TABLE}.{}", format.extension()))
}

/// Write the corpus as one feature table per requested format.
///
/// Returns the written paths in `formats` order.
pub fn write_feature_tables(
    corpus: &Corpus,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = feature_table_path(output_dir, format);
        debug!("Writing {} feature table: {}", format, path.display());

        let mut writer: Box<dyn TableWriter> = match format {
            OutputFormat::Csv => Box::new(CsvWriter::new(&path, corpus.n_features())?),
            OutputFormat::Parquet => Box::new(ParquetWriter::new(&path, corpus.n_features())?),
        };

        writer.write_header()?;
        for (row, features) in corpus.features().rows().into_iter().enumerate() {
            let label = corpus.label_set().name(corpus.labels()[row]);
            match features.as_slice() {
                Some(values) => writer.write_row(&corpus.ids()[row], label, values)?,
                None => writer.write_row(&corpus.ids()[row], label, &features.to_vec())?,
            }
        }
        writer.finalize()?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dataset::{CorpusBuilder, LabelSet};
    use crate::features::FeatureVector;
    use tempfile::TempDir;

    #[test]
    fn test_write_feature_tables_all_formats() {
        let mut builder = CorpusBuilder::new(LabelSet::new(["ar", "background"]), 2);
        builder.push("a", "ar", FeatureVector::from(vec![0.0, 1.0])).unwrap();
        builder
            .push("b", "background", FeatureVector::from(vec![1.0, 0.0]))
            .unwrap();
        let corpus = builder.finish("background").unwrap();

        let dir = TempDir::new().unwrap();
        let paths = write_feature_tables(
            &corpus,
            dir.path(),
            &[OutputFormat::Csv, OutputFormat::Parquet],
        )
        .unwrap();

        assert_eq!(paths[0], dir.path().join("features.csv"));
        assert_eq!(paths[1], dir.path().join("features.parquet"));
        assert!(paths.iter().all(|p| p.is_file()));

        let back = read_feature_table(&paths[0], corpus.label_set(), 2, "background").unwrap();
        assert_eq!(back.features(), corpus.features());
        assert_eq!(back.labels(), corpus.labels());
    }
}
