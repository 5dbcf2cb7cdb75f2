//! Parquet feature table writer.
//!
//! Writes the same columns as the CSV table: `id` and `label` as UTF-8 and
//! one non-nullable `Float32` column per pixel, Snappy compressed.

use arrow::array::{ArrayRef, Float32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{WriterProperties, WriterVersion};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::constants::output::PARQUET_BATCH_ROWS;
use crate::error::{Error, Result};
use crate::output::{TableWriter, table_columns};

/// Parquet writer for feature tables.
///
/// Buffers rows and writes them in record batches.
pub struct ParquetWriter {
    writer: Option<ArrowWriter<File>>,
    schema: Arc<Schema>,
    n_features: usize,
    ids: Vec<String>,
    labels: Vec<String>,
    values: Vec<f32>,
    batch_size: usize,
}

impl ParquetWriter {
    /// Create a new Parquet writer.
    ///
    /// # Errors
    ///
    /// Returns error if file creation fails or Parquet writer initialization fails.
    pub fn new(output_path: &Path, n_features: usize) -> Result<Self> {
        let schema = build_schema(n_features);
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .build();

        let file = File::create(output_path).map_err(|e| Error::ParquetFileCreate {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props)).map_err(|e| {
            Error::ParquetWrite {
                context: "Failed to initialize Parquet writer".to_string(),
                source: e,
            }
        })?;

        Ok(Self {
            writer: Some(writer),
            schema,
            n_features,
            ids: Vec::new(),
            labels: Vec::new(),
            values: Vec::new(),
            batch_size: PARQUET_BATCH_ROWS,
        })
    }

    /// Flush buffered rows to file.
    fn flush_batch(&mut self) -> Result<()> {
        if self.ids.is_empty() {
            return Ok(());
        }

        let batch = build_record_batch(
            &self.schema,
            &self.ids,
            &self.labels,
            &self.values,
            self.n_features,
        )?;
        if let Some(writer) = self.writer.as_mut() {
            writer.write(&batch).map_err(|e| Error::ParquetWrite {
                context: "Failed to write Parquet record batch".to_string(),
                source: e,
            })?;
        }
        self.ids.clear();
        self.labels.clear();
        self.values.clear();

        Ok(())
    }
}

impl TableWriter for ParquetWriter {
    fn write_header(&mut self) -> Result<()> {
        // the schema is embedded in the file footer
        Ok(())
    }

    fn write_row(&mut self, id: &str, label: &str, features: &[f32]) -> Result<()> {
        if features.len() != self.n_features {
            return Err(Error::DimensionMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", features.len()),
            });
        }

        self.ids.push(id.to_string());
        self.labels.push(label.to_string());
        self.values.extend_from_slice(features);

        if self.ids.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.flush_batch()?;
        if let Some(writer) = self.writer.take() {
            writer.close().map_err(|e| Error::ParquetWrite {
                context: "Failed to close Parquet writer".to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Build the Arrow schema for `n_features` pixel columns.
fn build_schema(n_features: usize) -> Arc<Schema> {
    let fields: Vec<Field> = table_columns(n_features)
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let data_type = if i < 2 {
                DataType::Utf8
            } else {
                DataType::Float32
            };
            Field::new(name, data_type, false)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Build a record batch from row-major buffered values.
fn build_record_batch(
    schema: &Arc<Schema>,
    ids: &[String],
    labels: &[String],
    values: &[f32],
    n_features: usize,
) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(n_features + 2);
    columns.push(Arc::new(StringArray::from_iter_values(ids)));
    columns.push(Arc::new(StringArray::from_iter_values(labels)));
    for j in 0..n_features {
        let column = Float32Array::from_iter_values(
            values.iter().skip(j).step_by(n_features.max(1)).copied(),
        );
        columns.push(Arc::new(column));
    }

    RecordBatch::try_new(schema.clone(), columns).map_err(|e| Error::Arrow {
        context: "Failed to build feature record batch".to_string(),
        source: e,
    })
}
