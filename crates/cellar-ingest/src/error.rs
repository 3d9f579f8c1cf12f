//! Error type for `cellar-ingest`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The source directory is missing or cannot be listed. Fatal for the
  /// whole run.
  #[error("cannot read source directory {path:?}: {source}")]
  SourceDirectory {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  /// A chunk does not fit the table's schema; the file is abandoned.
  #[error("schema error: {0}")]
  Schema(#[from] cellar_core::Error),

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
