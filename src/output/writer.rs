//! Feature table writer trait definition.

use crate::constants::output::{ID_COLUMN, LABEL_COLUMN, PIXEL_PREFIX};
use crate::error::Result;

/// Trait for writing feature tables, one row per recording.
pub trait TableWriter {
    /// Write the table header (if applicable).
    fn write_header(&mut self) -> Result<()>;

    /// Write a single recording's row.
    fn write_row(&mut self, id: &str, label: &str, features: &[f32]) -> Result<()>;

    /// Finalize the output (flush, close, etc.).
    fn finalize(&mut self) -> Result<()>;
}

/// Column names of a feature table with `n_features` pixel columns.
pub fn table_columns(n_features: usize) -> Vec<String> {
    let mut columns = Vec::with_capacity(n_features + 2);
    columns.push(ID_COLUMN.to_string());
    columns.push(LABEL_COLUMN.to_string());
    columns.extend((0..n_features).map(|i| format!("{PIXEL_PREFIX}{i}")));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns() {
        assert_eq!(table_columns(3), vec!["id", "label", "px_0", "px_1", "px_2"]);
    }
}
