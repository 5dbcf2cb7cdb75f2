//! CSV feature tables and the failure log.

use crate::constants::output::{ID_COLUMN, LABEL_COLUMN, PIXEL_PREFIX};
use crate::dataset::{Corpus, CorpusBuilder, LabelSet};
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::output::{TableWriter, table_columns};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV feature table writer.
pub struct CsvWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    n_features: usize,
    record: Vec<String>,
}

impl CsvWriter {
    /// Create a new CSV writer.
    pub fn new(path: &Path, n_features: usize) -> Result<Self> {
        let writer = csv::Writer::from_path(path).map_err(|e| Error::CsvWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            n_features,
            record: Vec::with_capacity(n_features + 2),
        })
    }

    fn write_record(&mut self) -> Result<()> {
        self.writer
            .write_record(&self.record)
            .map_err(|e| Error::CsvWrite {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl TableWriter for CsvWriter {
    fn write_header(&mut self) -> Result<()> {
        self.record = table_columns(self.n_features);
        self.write_record()
    }

    fn write_row(&mut self, id: &str, label: &str, features: &[f32]) -> Result<()> {
        if features.len() != self.n_features {
            return Err(Error::DimensionMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", features.len()),
            });
        }

        self.record.clear();
        self.record.push(id.to_string());
        self.record.push(label.to_string());
        // Display for f32 is the shortest string that parses back to the same bits
        self.record.extend(features.iter().map(f32::to_string));
        self.write_record()
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a CSV feature table into a corpus.
///
/// The table must have a `label` column naming a declared class and exactly
/// `feature_len` pixel columns. An `id` column is optional; without it rows
/// are named by position.
pub fn read_feature_table(
    path: &Path,
    label_set: &LabelSet,
    feature_len: usize,
    background_class: &str,
) -> Result<Corpus> {
    let read_err = |e: csv::Error| Error::FeatureTableRead {
        path: path.to_path_buf(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();
    let label_index = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| Error::InvalidFeatureTable {
            message: format!("missing '{LABEL_COLUMN}' column"),
        })?;
    let id_index = headers.iter().position(|h| h == ID_COLUMN);
    let pixel_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(PIXEL_PREFIX))
        .map(|(i, _)| i)
        .collect();

    if pixel_indices.len() != feature_len {
        return Err(Error::InvalidFeatureTable {
            message: format!(
                "expected {feature_len} '{PIXEL_PREFIX}*' columns, found {}",
                pixel_indices.len()
            ),
        });
    }

    let mut builder = CorpusBuilder::new(label_set.clone(), feature_len);
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(read_err)?;
        let line = row + 2;

        let label = record.get(label_index).unwrap_or_default();
        if label_set.index_of(label).is_none() {
            return Err(Error::InvalidFeatureTable {
                message: format!("line {line}: class '{label}' is not declared"),
            });
        }

        let mut values = Vec::with_capacity(feature_len);
        for &i in &pixel_indices {
            let raw = record.get(i).unwrap_or_default();
            let value: f32 = raw.parse().map_err(|_| Error::InvalidFeatureTable {
                message: format!(
                    "line {line}: '{raw}' in column {} is not a number",
                    headers.get(i).unwrap_or_default()
                ),
            })?;
            if !value.is_finite() {
                return Err(Error::InvalidFeatureTable {
                    message: format!("line {line}: non-finite feature value"),
                });
            }
            values.push(value);
        }

        let id = id_index
            .and_then(|i| record.get(i))
            .map_or_else(|| format!("row_{}", row + 1), str::to_string);
        builder.push(id, label, FeatureVector::from(values))?;
    }

    debug!("read {} rows from {}", builder.len(), path.display());
    builder.finish(background_class)
}

/// One recording that could not be turned into a feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Recording identifier.
    pub identifier: String,
    /// Declared class.
    pub class: String,
    /// Recording path.
    pub path: PathBuf,
    /// Rendered error.
    pub reason: String,
}

/// Write the failure log (header only when nothing failed).
pub fn write_failures(path: &Path, failures: &[Failure]) -> Result<()> {
    let write_err = |e: csv::Error| Error::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer
        .write_record(["identifier", "class", "path", "reason"])
        .map_err(write_err)?;
    for failure in failures {
        writer
            .write_record([
                failure.identifier.as_str(),
                failure.class.as_str(),
                &failure.path.display().to_string(),
                failure.reason.as_str(),
            ])
            .map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}
