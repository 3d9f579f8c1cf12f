//! Error type for `cellar-summary`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A relation the summary joins over is absent from the store.
  #[error("required table {0:?} is missing")]
  MissingTable(String),

  /// The summary query result lacks a column the engine reads.
  #[error("summary result has no column {0:?}")]
  MissingColumn(&'static str),

  /// A summary value cannot be read as the number it should be.
  #[error("summary row {row}, column {column:?}: {value:?} is not numeric")]
  Coercion {
    row:    usize,
    column: &'static str,
    value:  String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
