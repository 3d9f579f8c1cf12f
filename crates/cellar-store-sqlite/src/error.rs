//! Error type for `cellar-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cellar_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// The database file could not be opened.
  #[error("cannot open store at {path:?}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: rusqlite::Error,
  },

  #[error("table not found: {0:?}")]
  TableNotFound(String),

  #[error("cannot write table {0:?} without columns")]
  NoColumns(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
