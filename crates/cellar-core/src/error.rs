//! Error types for `cellar-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A value cannot be represented in the column type established for its
  /// table.
  #[error(
    "table {table:?}, row {row}, column {column:?}: cannot store {value} as {expected}"
  )]
  Coercion {
    table:    String,
    row:      usize,
    column:   String,
    value:    String,
    expected: crate::ColumnType,
  },

  /// A row carries a different number of fields than the table has columns.
  #[error("table {table:?}, row {row}: expected {expected} fields, found {found}")]
  FieldCount {
    table:    String,
    row:      usize,
    expected: usize,
    found:    usize,
  },

  /// A batch does not line up with the stored table's columns.
  #[error("table {table:?}: column mismatch, stored {stored:?}, batch {batch:?}")]
  ColumnMismatch {
    table:  String,
    stored: Vec<String>,
    batch:  Vec<String>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
